#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

//! # Pivnet CLI core
//!
//! Library behind the Pivnet command-line client: the pieces with real logic
//! rather than request/response plumbing.
//!
//! ## Architecture
//!
//! - **[`chunked_download`]** - Parallel ranged downloads with bounded retry
//! - **[`ranger`]** - Byte-range partitioning strategies
//! - **[`transport`]** - HTTP seam and the `reqwest` implementation
//! - **[`progress`]** - Progress observer contract and progress bar
//! - **[`retry`]** - Exponential backoff policy
//! - **[`version`]** - Release version comparison
//! - **[`release`]** - Release lookup, filtering and ordering
//! - **[`checksum`]** - SHA-256 verification of downloaded files
//! - **[`config`]** - Download settings
//! - **[`error`]** - Error types and error handling
//! - **[`logging`]** - Tracing subscriber setup

pub mod checksum;
pub mod chunked_download;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod ranger;
pub mod release;
pub mod retry;
pub mod transport;
pub mod version;

/// Error type alias for convenience
pub use error::{Error, Result};

/// Configuration type alias for convenience
pub use config::Config;

pub use chunked_download::{Downloader, WriteAt};
pub use ranger::{Range, RangeStrategy, Ranger};
pub use transport::{HttpTransport, ReqwestTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "pivnet";
