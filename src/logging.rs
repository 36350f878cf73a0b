//! Tracing bootstrap for host processes embedding the conversation core.
//!
//! Output goes to stderr so hosts that speak a JSON protocol on stdout
//! keep a clean channel. `RUST_LOG` overrides the default filter.

use crate::error::{ChatError, Result};
use tracing_subscriber::EnvFilter;

/// Initialise tracing to stderr with an env-filter override.
///
/// `default_filter` applies when `RUST_LOG` is unset (typically `"info"`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn try_init(default_filter: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter.to_owned())),
        )
        .try_init()
        .map_err(|e| ChatError::Config(format!("tracing init failed: {e}")))
}
