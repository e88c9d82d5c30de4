use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config, WeatherReport,
    auth::TokenCache,
    error::WeatherError,
    provider::qweather::QWeatherClient,
};

pub mod qweather;

/// Longest accepted place name, in characters.
pub const MAX_LOCATION_CHARS: usize = 20;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve `location_text` and fetch current conditions plus forecast.
    async fn fetch_weather(&self, location_text: &str) -> Result<WeatherReport, WeatherError>;
}

/// Reject empty or over-long place names before any network call.
/// Returns the trimmed text.
pub fn validate_location(location_text: &str) -> Result<&str, WeatherError> {
    let text = location_text.trim();

    if text.is_empty() {
        return Err(WeatherError::InvalidInput("location is empty".into()));
    }

    let len = text.chars().count();
    if len > MAX_LOCATION_CHARS {
        return Err(WeatherError::InvalidInput(format!(
            "location is {len} characters long, the limit is {MAX_LOCATION_CHARS}"
        )));
    }

    Ok(text)
}

/// Validate `config` and build the QWeather provider with a fresh token cache.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let settings = config.validate()?;
    let tokens = Arc::new(TokenCache::new(settings.refresh_lead));
    let client = QWeatherClient::new(&settings, tokens)?;

    Ok(Arc::new(client))
}
