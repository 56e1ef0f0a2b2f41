//! Default configuration values

/// Default number of parallel ranges (CPU count, clamped to 2..=16)
pub fn default_ranges() -> u64 {
    num_cpus::get().clamp(2, 16) as u64
}

/// Default connect timeout in seconds
pub const fn default_connect_timeout() -> u64 {
    10
}

/// Default read timeout in seconds (per body read, not per request)
pub const fn default_read_timeout() -> u64 {
    60
}

/// Progress bar shown by default
pub const fn default_show_progress() -> bool {
    true
}

/// Default max attempts per range, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default retry backoff base in milliseconds
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 100;

/// Default retry backoff ceiling in milliseconds
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 5_000;

/// Default max attempts per range (serde helper)
pub const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

/// Default backoff base (serde helper)
pub const fn default_backoff_base_ms() -> u64 {
    DEFAULT_BACKOFF_BASE_MS
}

/// Default backoff ceiling (serde helper)
pub const fn default_backoff_max_ms() -> u64 {
    DEFAULT_BACKOFF_MAX_MS
}
