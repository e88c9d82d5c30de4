use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, de::DeserializeOwned};
use std::{fmt, sync::Arc};

use crate::{
    auth::{Credential, EdDsaSigner, SigningIdentity, TokenCache, TokenSigner},
    config::Settings,
    error::{Stage, WeatherError},
    model::{ForecastDay, GeoResult, WeatherReport, WeatherSnapshot, display_field},
};

use super::{WeatherProvider, validate_location};

const GEO_LOOKUP_PATH: &str = "/geo/v2/city/lookup";
const WEATHER_NOW_PATH: &str = "/v7/weather/now";
const WEATHER_7D_PATH: &str = "/v7/weather/7d";

/// Application-level success code embedded in every response body.
const CODE_OK: &str = "200";
const CODE_NOT_FOUND: &str = "404";

/// QWeather client: geocode, current conditions and 7-day forecast, all
/// authenticated with one bearer token per lookup.
#[derive(Clone)]
pub struct QWeatherClient {
    http: Client,
    base_url: String,
    identity: SigningIdentity,
    signer: Arc<dyn TokenSigner>,
    tokens: Arc<TokenCache>,
}

impl fmt::Debug for QWeatherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QWeatherClient")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl QWeatherClient {
    pub fn new(settings: &Settings, tokens: Arc<TokenCache>) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout)
            .build()
            .map_err(|e| WeatherError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::from_parts(
            http,
            &settings.api_host,
            settings.identity.clone(),
            Arc::new(EdDsaSigner::new(settings.token_lifespan)),
            tokens,
        ))
    }

    pub fn from_parts(
        http: Client,
        base_url: &str,
        identity: SigningIdentity,
        signer: Arc<dyn TokenSigner>,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            identity,
            signer,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// Cached-or-fresh credential for the configured identity.
    pub fn credential(&self) -> Result<Credential, WeatherError> {
        self.tokens.get_valid_token(self.signer.as_ref(), &self.identity, Utc::now())
    }

    async fn lookup_city(&self, location: &str, cred: &Credential) -> Result<GeoResult, WeatherError> {
        let (parsed, body): (GeoResponse, _) =
            self.get_json(Stage::Geocode, GEO_LOOKUP_PATH, location, cred).await?;

        if parsed.code == CODE_NOT_FOUND {
            tracing::info!(location, "no city matches");
            return Err(WeatherError::LocationNotFound(location.to_string()));
        }
        check_code(Stage::Geocode, &parsed.code, &body)?;

        let first = parsed
            .location
            .and_then(|list| list.into_iter().next())
            .ok_or_else(|| {
                tracing::info!(location, "city lookup returned an empty list");
                WeatherError::LocationNotFound(location.to_string())
            })?;

        Ok(GeoResult {
            city_id: first.id,
            country: first.country,
            adm1: first.adm1,
            adm2: first.adm2,
        })
    }

    async fn fetch_now(&self, city_id: &str, cred: &Credential) -> Result<WeatherSnapshot, WeatherError> {
        let (parsed, body): (NowResponse, _) =
            self.get_json(Stage::Now, WEATHER_NOW_PATH, city_id, cred).await?;
        check_code(Stage::Now, &parsed.code, &body)?;

        let now = parsed.now.ok_or_else(|| WeatherError::ResponseFormat {
            stage: Stage::Now,
            message: "response has no `now` object".into(),
        })?;

        Ok(WeatherSnapshot {
            update_time: parsed.update_time,
            temperature: now.temp,
            feels_like: now.feels_like,
            condition_text: now.text,
            wind_direction: now.wind_dir,
            wind_scale: now.wind_scale,
            humidity: now.humidity,
            precipitation: now.precip,
            visibility: now.vis,
        })
    }

    async fn fetch_forecast(&self, city_id: &str, cred: &Credential) -> Result<Vec<ForecastDay>, WeatherError> {
        let (parsed, body): (ForecastResponse, _) =
            self.get_json(Stage::Forecast, WEATHER_7D_PATH, city_id, cred).await?;
        check_code(Stage::Forecast, &parsed.code, &body)?;

        parsed.daily.ok_or_else(|| WeatherError::ResponseFormat {
            stage: Stage::Forecast,
            message: "response has no `daily` list".into(),
        })
    }

    /// GET `{base}{path}?location=..`, require HTTP 200 and a JSON body.
    /// Returns the decoded body along with its raw text for diagnostics.
    async fn get_json<T: DeserializeOwned>(
        &self,
        stage: Stage,
        path: &str,
        location: &str,
        cred: &Credential,
    ) -> Result<(T, String), WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%stage, %url, location, "requesting");

        let res = self
            .http
            .get(&url)
            .query(&[("location", location)])
            .header(header::AUTHORIZATION, cred.bearer())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| {
                tracing::error!(%stage, %url, error = %source, "request could not be sent");
                WeatherError::Network { stage, source }
            })?;

        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = res.text().await.map_err(|source| {
            tracing::error!(%stage, %url, %status, error = %source, "failed to read response body");
            WeatherError::Network { stage, source }
        })?;

        if status != StatusCode::OK {
            tracing::error!(%stage, %url, %status, body = %truncate_body(&body), "provider returned an error status");
            return Err(WeatherError::Upstream {
                stage,
                status: status.as_u16(),
                code: None,
                message: truncate_body(&body),
            });
        }

        if !content_type.to_ascii_lowercase().contains("json") {
            tracing::error!(%stage, %url, %content_type, body = %truncate_body(&body), "response is not JSON");
            return Err(WeatherError::ResponseFormat {
                stage,
                message: format!("unexpected content type '{content_type}'"),
            });
        }

        let parsed = serde_json::from_str::<T>(&body).map_err(|e| {
            tracing::error!(%stage, %url, error = %e, body = %truncate_body(&body), "failed to decode response");
            WeatherError::ResponseFormat { stage, message: e.to_string() }
        })?;

        Ok((parsed, body))
    }
}

#[async_trait]
impl WeatherProvider for QWeatherClient {
    #[tracing::instrument(skip(self), level = "info")]
    async fn fetch_weather(&self, location_text: &str) -> Result<WeatherReport, WeatherError> {
        let location = validate_location(location_text)?;

        // One credential for all three stages of this lookup.
        let cred = self.credential()?;

        let geo = self.lookup_city(location, &cred).await?;
        tracing::info!(city_id = %geo.city_id, "resolved location");

        let current = self.fetch_now(&geo.city_id, &cred).await?;
        let forecast = self.fetch_forecast(&geo.city_id, &cred).await?;
        tracing::info!(city_id = %geo.city_id, days = forecast.len(), "weather fetched");

        Ok(WeatherReport { geo, current, forecast })
    }
}

fn check_code(stage: Stage, code: &str, body: &str) -> Result<(), WeatherError> {
    if code == CODE_OK {
        return Ok(());
    }

    tracing::error!(%stage, code, body = %truncate_body(body), "provider returned a failure code");
    Err(WeatherError::Upstream {
        stage,
        status: StatusCode::OK.as_u16(),
        code: Some(code.to_string()),
        message: truncate_body(body),
    })
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    code: String,
    #[serde(default)]
    location: Option<Vec<GeoLocation>>,
}

#[derive(Debug, Deserialize)]
struct GeoLocation {
    id: String,
    #[serde(default, deserialize_with = "display_field")]
    country: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    adm1: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    adm2: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NowResponse {
    code: String,
    #[serde(rename = "updateTime", default, deserialize_with = "display_field")]
    update_time: Option<String>,
    #[serde(default)]
    now: Option<NowBlock>,
}

#[derive(Debug, Deserialize)]
struct NowBlock {
    #[serde(default, deserialize_with = "display_field")]
    temp: Option<String>,
    #[serde(rename = "feelsLike", default, deserialize_with = "display_field")]
    feels_like: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    text: Option<String>,
    #[serde(rename = "windDir", default, deserialize_with = "display_field")]
    wind_dir: Option<String>,
    #[serde(rename = "windScale", default, deserialize_with = "display_field")]
    wind_scale: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    humidity: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    precip: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    vis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    code: String,
    #[serde(default)]
    daily: Option<Vec<ForecastDay>>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
