use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather service settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Exchange-rate service settings
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Page markup input and rendered output
    #[serde(default)]
    pub page: PageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// weatherapi.com key; `WEATHER_API_KEY` overrides the file value
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Refresh interval in minutes
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_weather_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

fn default_refresh_minutes() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_weather_base_url(),
            refresh_minutes: default_refresh_minutes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WeatherConfig {
    /// Interval between weather refresh ticks
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_minutes) * 60)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// exchangerate-api.com key; `EXCHANGE_API_KEY` overrides the file value
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the exchange-rate API (the key is appended as a path segment)
    #[serde(default = "default_exchange_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_exchange_base_url() -> String {
    "https://v6.exchangerate-api.com/v6".to_string()
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_exchange_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Markup the dashboard reads cities from and writes results into
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    /// Where the rendered page is written after every update (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

fn default_template_path() -> PathBuf {
    PathBuf::from("index.html")
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            output_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there first if it is missing.
    ///
    /// API keys from the environment take precedence over the file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents).context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::load()?.into_validated()
    }

    /// Validate an already loaded configuration.
    ///
    /// A missing API key is reported as [`ConfigError::MissingSetting`], any
    /// other error as [`ConfigError::Invalid`]. Warnings are logged.
    pub fn into_validated(self) -> Result<(Self, ValidationResult)> {
        for (field, key, env) in [
            ("weather.api_key", &self.weather.api_key, "WEATHER_API_KEY"),
            ("exchange.api_key", &self.exchange.api_key, "EXCHANGE_API_KEY"),
        ] {
            if key.trim().is_empty() {
                return Err(ConfigError::MissingSetting(format!("{} (or {})", field, env)).into());
            }
        }

        let validation = self.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("WEATHER_API_KEY") {
            self.weather.api_key = key;
        }
        if let Ok(key) = std::env::var("EXCHANGE_API_KEY") {
            self.exchange.api_key = key;
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        self.validate_url(&self.exchange.base_url, "exchange.base_url", &mut result);

        if self.weather.api_key.trim().is_empty() {
            result.add_error("weather.api_key", "Weather API key is required");
        }
        if self.exchange.api_key.trim().is_empty() {
            result.add_error("exchange.api_key", "Exchange API key is required");
        }

        if self.weather.refresh_minutes == 0 {
            result.add_error(
                "weather.refresh_minutes",
                "Refresh interval must be greater than 0",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        for (field, secs) in [
            ("weather.timeout_secs", self.weather.timeout_secs),
            ("exchange.timeout_secs", self.exchange.timeout_secs),
        ] {
            if secs == 0 {
                result.add_error(field, "Timeout must be greater than 0");
            } else if secs > 120 {
                result.add_warning(field, "Timeout is unusually long (>120s)");
            }
        }

        if self.page.template_path.as_os_str().is_empty() {
            result.add_error("page.template_path", "Template path is required");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("traveldash");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.weather.api_key = "weather-key".to_string();
        config.exchange.api_key = "exchange-key".to_string();
        config
    }

    #[test]
    fn test_default_refresh_is_five_minutes() {
        let config = Config::default();
        assert_eq!(config.weather.refresh_interval(), Duration::from_secs(300));
        assert_eq!(config.weather.base_url, "http://api.weatherapi.com/v1");
        assert_eq!(config.exchange.base_url, "https://v6.exchangerate-api.com/v6");
    }

    #[test]
    fn test_configured_keys_are_valid() {
        let result = configured().validate();
        assert!(result.is_valid(), "Config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_missing_api_keys() {
        let result = Config::default().validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.api_key"));
        assert!(result.errors.iter().any(|e| e.field == "exchange.api_key"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = configured();
        config.weather.base_url = "ftp://api.weatherapi.com/v1".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = configured();
        config.exchange.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "exchange.base_url"));
    }

    #[test]
    fn test_zero_refresh_is_error() {
        let mut config = configured();
        config.weather.refresh_minutes = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.refresh_minutes"));
    }

    #[test]
    fn test_long_timeout_is_warning() {
        let mut config = configured();
        config.exchange.timeout_secs = 600;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "exchange.timeout_secs"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[weather]\napi_key = \"from-file\"\nrefresh_minutes = 10\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.weather.refresh_minutes, 10);
        assert_eq!(config.weather.timeout_secs, 10);
        assert_eq!(config.exchange.base_url, "https://v6.exchangerate-api.com/v6");
        assert_eq!(config.page.template_path, PathBuf::from("index.html"));
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::load_from(&path).unwrap();
        assert!(path.exists());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("refresh_minutes = 5"));
    }

    #[test]
    fn test_into_validated_reports_missing_key() {
        let mut config = configured();
        config.exchange.api_key = "  ".to_string();

        let err = config.into_validated().unwrap_err();
        match err.downcast::<ConfigError>() {
            Ok(ConfigError::MissingSetting(setting)) => {
                assert!(setting.contains("exchange.api_key"));
                assert!(setting.contains("EXCHANGE_API_KEY"));
            }
            other => panic!("expected MissingSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_into_validated_rejects_invalid_config() {
        let mut config = configured();
        config.weather.timeout_secs = 0;

        let err = config.into_validated().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid(summary)) if summary.contains("weather.timeout_secs")
        ));
    }

    #[test]
    fn test_into_validated_keeps_warnings() {
        let mut config = configured();
        config.weather.refresh_minutes = 2000;

        let (config, validation) = config.into_validated().unwrap();
        assert_eq!(config.weather.refresh_minutes, 2000);
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
