//! Logging setup
//!
//! Installs a `tracing` subscriber. `RUST_LOG` wins over the configured level
//! so a single module can be turned up without editing config.

use tracing_subscriber::EnvFilter;

use crate::core::config::{LogFormat, LoggingConfig};
use crate::core::error::{Error, Result};

/// Install the global subscriber described by `config`
///
/// Calling this more than once is harmless; only the first subscriber sticks.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::config(format!("Invalid log level {}: {}", config.level, e)))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed; keeping it");
    }
    Ok(())
}
