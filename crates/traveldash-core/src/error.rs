//! Errors raised while bootstrapping and hosting the dashboard.
//!
//! Service crates carry their own error enums (weather, exchange); the binary
//! reports everything else through [`AppError`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot read page template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write rendered page {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short console hint for the error.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Template { .. } => "Check page.template_path in config.toml.",
            AppError::Output { .. } => "Check page.output_path in config.toml.",
            AppError::Other(_) => "Traveldash could not start. See the log for details.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config is invalid: {0}")]
    Invalid(String),

    #[error("{0} is not set")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Fix the reported settings in config.toml and restart.",
            ConfigError::MissingSetting(_) => {
                "Set the API key in config.toml or through the environment."
            }
        }
    }
}
