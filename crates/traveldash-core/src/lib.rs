//! Shared configuration, errors and logging setup for Traveldash.

pub mod config;
pub mod error;

pub use config::{
    Config, ConfigValidationError, ExchangeConfig, PageConfig, ValidationResult, WeatherConfig,
};
pub use error::{AppError, ConfigError};

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global tracing subscriber. Fails if one is already installed.
pub fn init() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    tracing::debug!("Logging initialized");
    Ok(())
}
