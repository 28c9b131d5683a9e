/// Current weather snapshot for one city.
///
/// Built fresh for every fetch and consumed by a single page update.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    /// Name as it appears on the page
    pub city_name: String,
    /// Feels-like temperature in Fahrenheit
    pub temp: f64,
    /// Local date/time at the city, as reported by the service
    pub local_time: String,
    /// Condition description, e.g. "Partly cloudy"
    pub weather_state: String,
    /// Condition icon URL (often protocol-relative)
    pub weather_icon: String,
}

impl City {
    pub fn new(
        city_name: impl Into<String>,
        temp: f64,
        local_time: impl Into<String>,
        weather_state: impl Into<String>,
        weather_icon: impl Into<String>,
    ) -> Self {
        Self {
            city_name: city_name.into(),
            temp,
            local_time: local_time.into(),
            weather_state: weather_state.into(),
            weather_icon: weather_icon.into(),
        }
    }

    /// Page element id for this city: the name with all whitespace removed.
    pub fn page_key(&self) -> String {
        page_key(&self.city_name)
    }
}

/// Strip every whitespace character from a city name.
pub fn page_key(city_name: &str) -> String {
    city_name.split_whitespace().collect()
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("API quota exceeded")]
    QuotaExceeded,
    #[error("Weather API error: {0}")]
    ApiError(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(_) => "Unable to reach the weather service.",
            WeatherError::LocationNotFound(_) => "City not found by the weather service.",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check settings.",
            WeatherError::QuotaExceeded => "Weather API quota exceeded. Try again later.",
            WeatherError::ApiError(_) => "Weather service error. Please try again.",
            WeatherError::Parse(_) => "Weather service returned unexpected data.",
        }
    }
}
