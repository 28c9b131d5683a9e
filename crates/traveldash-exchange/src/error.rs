//! Exchange-rate error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Invalid or inactive API key")]
    InvalidApiKey,

    #[error("Unsupported currency code: {0}")]
    UnsupportedCode(String),

    #[error("API quota reached")]
    QuotaReached,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ExchangeError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidApiKey => "Exchange API key is invalid. Check settings.".to_string(),
            Self::UnsupportedCode(code) => format!("Currency {} is not supported.", code),
            Self::QuotaReached => "Exchange API quota reached. Try again later.".to_string(),
            Self::ApiError(msg) => format!("Exchange service error: {}", msg),
            Self::Parse(_) => "Exchange service returned unexpected data.".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Map the service's `error-type` field onto an error.
    pub fn from_error_type(error_type: &str, base: &str) -> Self {
        match error_type {
            "invalid-key" | "inactive-account" => Self::InvalidApiKey,
            "unsupported-code" | "malformed-request" => Self::UnsupportedCode(base.to_string()),
            "quota-reached" => Self::QuotaReached,
            other => Self::ApiError(other.to_string()),
        }
    }
}
