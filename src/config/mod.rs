//! Configuration management for the downloader
//!
//! Handles loading and validating download settings: how many ranges to split
//! a file into, how hard to retry, and which timeouts the HTTP client uses.

use crate::error::{Error, Result};
use crate::ranger::Ranger;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod defaults;

pub use defaults::*;

/// Download settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Upper bound on parallel ranges per file
    #[serde(default = "defaults::default_ranges")]
    pub ranges: u64,

    /// Retry behaviour for ranged requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Connection timeout in seconds
    #[serde(default = "defaults::default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds
    #[serde(default = "defaults::default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Render a progress bar while downloading
    #[serde(default = "defaults::default_show_progress")]
    pub show_progress: bool,
}

/// Retry settings as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per range, including the first
    #[serde(default = "defaults::default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base in milliseconds
    #[serde(default = "defaults::default_backoff_base_ms")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "defaults::default_backoff_max_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BACKOFF_BASE_MS,
            max_delay_ms: DEFAULT_BACKOFF_MAX_MS,
        }
    }
}

impl Config {
    /// Load configuration from default location
    ///
    /// Tries in order:
    /// 1. `XDG_CONFIG_HOME/pivnet/download.toml`
    /// 2. `~/.config/pivnet/download.toml`
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .and_then(|path| if path.is_empty() { None } else { Some(path) })
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

        config_home
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "Could not determine config directory: XDG_CONFIG_HOME not set and no home directory found"
                        .to_string(),
                )
            })
            .map(|path| path.join("pivnet").join("download.toml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ranges == 0 {
            return Err(Error::InvalidConfig(
                "ranges must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::InvalidConfig(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Retry policy for ranged requests
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    /// Range partitioning strategy
    #[must_use]
    pub const fn ranger(&self) -> Ranger {
        Ranger::new(self.ranges)
    }

    /// Connect timeout as a duration
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a duration
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ranges: default_ranges(),
            retry: RetryConfig::default(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            show_progress: default_show_progress(),
        }
    }
}
