//! Error types and handling for the Pivnet CLI core
//!
//! Provides structured error types for downloads, configuration, release lookup
//! and version parsing, with enough context to tell which phase failed.

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Pivnet CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for Pivnet CLI operations
#[derive(Error, Debug)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════
    // Download Setup Errors
    // ═══════════════════════════════════════════════════════════════
    /// HEAD request used to size the download failed
    #[error("failed to make HEAD request to {url}: {source}")]
    Head {
        /// URL the HEAD request was sent to
        url: String,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// HEAD response carried no usable Content-Length
    #[error("HEAD response from {url} did not report a content length")]
    MissingContentLength {
        /// Effective URL after redirects
        url: String,
    },

    /// Range partitioning failed
    #[error("failed to construct range: {0}")]
    BuildRange(#[from] RangeError),

    // ═══════════════════════════════════════════════════════════════
    // Download Fetch Errors
    // ═══════════════════════════════════════════════════════════════
    /// A ranged GET failed for good
    #[error("failed during retryable request for range {range}: {source}")]
    Fetch {
        /// Range header value of the failing request
        range: String,
        /// Per-range failure
        #[source]
        source: FetchError,
    },

    /// A fetch task did not run to completion
    #[error("download task aborted: {0}")]
    Task(String),

    // ═══════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════
    /// Failed to read configuration file
    #[error("Failed to read config from {path}: {reason}")]
    ConfigRead {
        /// Config file path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ═══════════════════════════════════════════════════════════════
    // Release & Version Errors
    // ═══════════════════════════════════════════════════════════════
    /// Version string could not be compared
    #[error(transparent)]
    Version(#[from] VersionError),

    /// No release carries the requested version
    #[error("release not found for version: '{version}'")]
    ReleaseNotFound {
        /// Requested version
        version: String,
    },

    /// Release version filter is not a valid regular expression
    #[error("invalid release version pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Release listing could not be decoded
    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ═══════════════════════════════════════════════════════════════
    // Integrity Errors
    // ═══════════════════════════════════════════════════════════════
    /// Downloaded file does not match its published digest
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// File that was hashed
        path: PathBuf,
        /// Published digest
        expected: String,
        /// Computed digest
        actual: String,
    },

    // ═══════════════════════════════════════════════════════════════
    // I/O Errors
    // ═══════════════════════════════════════════════════════════════
    /// File operation failed
    #[error("File operation failed: {path}: {reason}")]
    FileError {
        /// File involved
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}

impl Error {
    /// Get the exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigRead { .. } | Self::InvalidConfig(_) => 2,
            Self::Head { .. } | Self::MissingContentLength { .. } => 4,
            Self::ReleaseNotFound { .. }
            | Self::InvalidPattern(_)
            | Self::Version(_)
            | Self::DeserializationError(_) => 5,
            Self::BuildRange(_) | Self::Fetch { .. } | Self::Task(_) => 7,
            Self::ChecksumMismatch { .. } => 8,
            Self::FileError { .. } => 1,
        }
    }

    /// Whether reissuing the whole operation could plausibly succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Head { source, .. } => source.is_transient(),
            Self::Fetch { source, .. } => {
                matches!(source, FetchError::RetriesExhausted { .. })
            }
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::FileError {
            path: PathBuf::from("<unknown>"),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            Self::DeserializationError(format!("JSON syntax error: {err}"))
        } else {
            Self::DeserializationError(err.to_string())
        }
    }
}

/// How a transport failure should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Timeouts, refused or reset connections
    Temporary,
    /// Body ended before the advertised length
    UnexpectedEof,
    /// Anything that will not get better by asking again
    Fatal,
}

/// Network failure reported by an [`HttpTransport`](crate::transport::HttpTransport)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Create an error of the given kind
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A failure worth retrying immediately
    pub fn temporary(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Temporary, message)
    }

    /// A truncated response body
    pub fn unexpected_eof(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::UnexpectedEof, message)
    }

    /// A failure that retrying will not fix
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Fatal, message)
    }

    /// Classification of this failure
    #[must_use]
    pub const fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Whether this failure is classified as temporary
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Temporary)
    }

    /// Whether the response body was cut short
    #[must_use]
    pub const fn is_unexpected_eof(&self) -> bool {
        matches!(self.kind, TransportErrorKind::UnexpectedEof)
    }

    /// Temporary or truncated: the ranged GET should be reissued
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self.kind, TransportErrorKind::Fatal)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_body() || err.is_decode() {
            TransportErrorKind::UnexpectedEof
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            TransportErrorKind::Temporary
        } else {
            TransportErrorKind::Fatal
        };
        Self::new(kind, err.to_string())
    }
}

/// Failure of a single ranged fetch task
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with something other than 206 Partial Content
    #[error("during GET unexpected status code was returned: {status}")]
    Status {
        /// Status code received
        status: u16,
    },

    /// Server sent more bytes than the range asked for
    #[error("range body too long: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Bytes in the requested range
        expected: u64,
        /// Bytes received
        actual: u64,
    },

    /// Non-transient network failure
    #[error(transparent)]
    Transport(TransportError),

    /// Transient failures persisted past the retry budget
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Last failure observed
        last: TransportError,
    },

    /// Positional write into the destination failed
    #[error("failed to write range to destination: {0}")]
    Write(#[source] std::io::Error),
}

/// Range partitioning failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Nothing to partition
    #[error("content length cannot be zero")]
    EmptyContent,

    /// Strategy configured to produce no ranges
    #[error("range count must be greater than zero")]
    ZeroPartitions,

    /// Strategy configured with a zero-byte chunk size
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// Version segment that is not a base-10 integer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version segment '{segment}' in '{version}': {source}")]
pub struct VersionError {
    /// Raw version string as supplied
    pub version: String,
    /// Offending segment after letters were stripped
    pub segment: String,
    /// Integer parse failure
    #[source]
    pub source: ParseIntError,
}
