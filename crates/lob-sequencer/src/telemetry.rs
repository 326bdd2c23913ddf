//! Logging setup.
//!
//! `lob-core` only emits `tracing` events; installing a subscriber is left to
//! whoever hosts the sequencer.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Parse the configured `log_filter` directives.
pub fn env_filter(config: &Config) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter `{}`", config.log_filter))
}

/// Install a fmt subscriber filtered by `config.log_filter` (set through
/// `LOB_LOG` or the config file).
///
/// Returns `Ok(false)` if a global subscriber was already installed, in which
/// case nothing changes; calling this more than once is harmless.
pub fn init_tracing(config: &Config) -> Result<bool> {
    let filter = env_filter(config)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok())
}
