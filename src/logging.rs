//! Structured logging setup
//!
//! `RUST_LOG` takes precedence; otherwise the crate logs at `info`, or `debug`
//! when verbose output is requested.

use tracing_subscriber::EnvFilter;

/// Build the filter used by [`init`]
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pivnet_cli=debug")
        } else {
            EnvFilter::new("pivnet_cli=info")
        }
    })
}

/// Install the global tracing subscriber.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        init(false);
        init(true);
        tracing::info!("logging initialized twice without panicking");
    }
}
