//! exchangerate-api.com v6 client.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::instrument;

use traveldash_core::ExchangeConfig;

use crate::error::ExchangeError;

/// Conversion rates keyed by currency code, relative to one base currency.
pub type Rates = HashMap<String, f64>;

/// Anything that can produce the full rate table for a base currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<Rates, ExchangeError>;
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    conversion_rates: Option<Rates>,
}

pub struct ExchangeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ExchangeClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch every conversion rate for `base`.
    ///
    /// The mapping is rebuilt from the response on every call.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_rates(&self, base: &str) -> Result<Rates, ExchangeError> {
        let url = format!(
            "{}/{}/latest/{}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(base),
        );

        let response = self.client.get(&url).send().await?;
        let rates = self.handle_response(response, base).await?;

        tracing::info!("Fetched {} rates for base {}", rates.len(), base);
        Ok(rates)
    }

    /// The service reports failures in the body as well as the status line.
    async fn handle_response(
        &self,
        response: reqwest::Response,
        base: &str,
    ) -> Result<Rates, ExchangeError> {
        let status = response.status();
        let text = response.text().await?;
        let body = serde_json::from_str::<LatestResponse>(&text);

        match body {
            Ok(body) if body.result == "error" => {
                let error_type = body.error_type.unwrap_or_default();
                Err(ExchangeError::from_error_type(&error_type, base))
            }
            _ if !status.is_success() => Err(ExchangeError::ApiError(format!("{}: {}", status, text))),
            Ok(LatestResponse {
                conversion_rates: Some(rates),
                ..
            }) => Ok(rates),
            Ok(_) => Err(ExchangeError::Parse("missing conversion_rates".to_string())),
            Err(e) => Err(ExchangeError::Parse(e.to_string())),
        }
    }
}

#[async_trait]
impl RateSource for ExchangeClient {
    async fn fetch_rates(&self, base: &str) -> Result<Rates, ExchangeError> {
        ExchangeClient::fetch_rates(self, base).await
    }
}
