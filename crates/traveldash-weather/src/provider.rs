use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use traveldash_core::WeatherConfig;

use crate::types::{City, WeatherError};

/// Anything that can produce a current-weather snapshot for a city name.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(&self, city_name: &str) -> Result<City, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    location: ApiLocation,
    current: ApiCurrent,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    feelslike_f: f64,
    condition: ApiCondition,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: i64,
    message: String,
}

/// weatherapi.com "current conditions" client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch current conditions for `city_name`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_weather(&self, city_name: &str) -> Result<City, WeatherError> {
        let url = format!("{}/current.json", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city_name)])
            .send()
            .await?;

        let body = self.handle_response(response, city_name).await?;

        tracing::debug!(
            "{}: {}°F, {}",
            city_name,
            body.current.feelslike_f,
            body.current.condition.text
        );

        Ok(City::new(
            city_name,
            body.current.feelslike_f,
            body.location.localtime,
            body.current.condition.text,
            body.current.condition.icon,
        ))
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
        city_name: &str,
    ) -> Result<CurrentResponse, WeatherError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| WeatherError::Parse(e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .map(|body| body.error);

        // https://www.weatherapi.com/docs/#intro-error-codes
        match (status.as_u16(), detail.as_ref().map(|d| d.code)) {
            (_, Some(1006)) => Err(WeatherError::LocationNotFound(city_name.to_string())),
            (_, Some(2007)) => Err(WeatherError::QuotaExceeded),
            (401 | 403, _) | (_, Some(1002 | 2006 | 2008)) => Err(WeatherError::InvalidApiKey),
            _ => {
                let message = detail.map(|d| d.message).unwrap_or(text);
                Err(WeatherError::ApiError(format!("{}: {}", status, message)))
            }
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_weather(&self, city_name: &str) -> Result<City, WeatherError> {
        WeatherClient::fetch_weather(self, city_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherClient {
        let config = WeatherConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            ..WeatherConfig::default()
        };
        WeatherClient::new(&config).unwrap()
    }

    fn current_body(feelslike_f: f64, localtime: &str, text: &str, icon: &str) -> serde_json::Value {
        serde_json::json!({
            "location": {
                "name": "Tokyo",
                "country": "Japan",
                "localtime": localtime
            },
            "current": {
                "temp_f": feelslike_f - 2.0,
                "feelslike_f": feelslike_f,
                "condition": { "text": text, "icon": icon, "code": 1000 }
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_weather_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("key", "test-key"))
            .and(query_param("q", "Tokyo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body(
                70.0,
                "2024-01-01 10:00",
                "Clear",
                "//icon.png",
            )))
            .mount(&mock_server)
            .await;

        let city = client_for(&mock_server).fetch_weather("Tokyo").await.unwrap();

        assert_eq!(city.city_name, "Tokyo");
        assert_eq!(city.temp, 70.0);
        assert_eq!(city.local_time, "2024-01-01 10:00");
        assert_eq!(city.weather_state, "Clear");
        assert_eq!(city.weather_icon, "//icon.png");
    }

    #[tokio::test]
    async fn test_city_name_with_spaces_is_sent_as_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("q", "New York"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body(
                30.5,
                "2024-01-01 20:00",
                "Light snow",
                "//snow.png",
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let city = client_for(&mock_server).fetch_weather("New York").await.unwrap();
        assert_eq!(city.city_name, "New York");
        assert_eq!(city.page_key(), "NewYork");
    }

    #[tokio::test]
    async fn test_location_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": 1006, "message": "No matching location found." }
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_weather("Atlantis").await;
        assert!(matches!(result, Err(WeatherError::LocationNotFound(name)) if name == "Atlantis"));
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "code": 2006, "message": "API key is invalid." }
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_weather("Tokyo").await;
        assert!(matches!(result, Err(WeatherError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_quota_exceeded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": 2007, "message": "API key has exceeded calls per month quota." }
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_weather("Tokyo").await;
        assert!(matches!(result, Err(WeatherError::QuotaExceeded)));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_weather("Tokyo").await;
        match result {
            Err(WeatherError::ApiError(msg)) => {
                assert!(msg.contains("503"), "Error should mention status: {}", msg);
                assert!(msg.contains("upstream unavailable"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "localtime": "2024-01-01 10:00" }
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_weather("Tokyo").await;
        assert!(matches!(result, Err(WeatherError::Parse(_))));
    }
}
