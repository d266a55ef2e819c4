//! Subscriber setup for the command-line binary.
//!
//! Filter priority, highest first:
//! 1. `WORDTALLY_LOG` environment variable (full `EnvFilter` syntax)
//! 2. `--verbose` (debug)
//! 3. `logging.level` from the config file
//!
//! Logs go to stderr so stdout stays machine-readable.

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigError;

pub const LOG_ENV: &str = "WORDTALLY_LOG";

pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<(), ConfigError> {
    let filter = build_env_filter(config, verbose)?;

    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let subscriber = Registry::default().with(filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    // lopdf and other dependencies log through the `log` facade.
    tracing_log::LogTracer::init().map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(())
}

fn build_env_filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    let level = if verbose { "debug" } else { config.level.as_str() };

    EnvFilter::try_new(level).map_err(|e| ConfigError::Validation {
        message: format!("Invalid log level '{}': {}", level, e),
    })
}
