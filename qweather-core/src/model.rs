use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Free-text place name as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub raw_text: String,
}

impl LocationQuery {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self { raw_text: raw_text.into() }
    }
}

/// First match of a city lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoResult {
    pub city_id: String,
    pub country: Option<String>,
    pub adm1: Option<String>,
    pub adm2: Option<String>,
}

/// Current conditions. Values are kept as the provider renders them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub update_time: Option<String>,
    pub temperature: Option<String>,
    pub feels_like: Option<String>,
    pub condition_text: Option<String>,
    pub wind_direction: Option<String>,
    pub wind_scale: Option<String>,
    pub humidity: Option<String>,
    pub precipitation: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    #[serde(rename = "fxDate", default, deserialize_with = "display_field")]
    pub date: Option<String>,
    #[serde(rename = "textDay", default, deserialize_with = "display_field")]
    pub condition_text: Option<String>,
    #[serde(rename = "tempMax", default, deserialize_with = "display_field")]
    pub temp_max: Option<String>,
    #[serde(rename = "tempMin", default, deserialize_with = "display_field")]
    pub temp_min: Option<String>,
    #[serde(rename = "uvIndex", default, deserialize_with = "display_field")]
    pub uv_index: Option<String>,
}

/// Daily forecasts in order; index 0 is today.
pub type ForecastSet = Vec<ForecastDay>;

/// Everything needed to compose a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub geo: GeoResult,
    pub current: WeatherSnapshot,
    pub forecast: ForecastSet,
}

impl WeatherReport {
    /// UV index of today's forecast entry, shown with current conditions.
    pub fn today_uv_index(&self) -> Option<&str> {
        self.forecast.first().and_then(|d| d.uv_index.as_deref())
    }
}

/// Accepts a JSON string or number for display-only fields.
/// `null`, objects and arrays are treated as missing.
pub(crate) fn display_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_day_accepts_strings_and_numbers() {
        let day: ForecastDay = serde_json::from_value(serde_json::json!({
            "fxDate": "2023-10-27",
            "textDay": "Cloudy",
            "tempMax": 24,
            "tempMin": "15",
            "uvIndex": null
        }))
        .unwrap();

        assert_eq!(day.date.as_deref(), Some("2023-10-27"));
        assert_eq!(day.temp_max.as_deref(), Some("24"));
        assert_eq!(day.temp_min.as_deref(), Some("15"));
        assert_eq!(day.uv_index, None);
    }

    #[test]
    fn forecast_day_tolerates_missing_fields() {
        let day: ForecastDay = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(day, ForecastDay::default());
    }

    #[test]
    fn today_uv_index_comes_from_day_zero() {
        let report = WeatherReport {
            geo: GeoResult { city_id: "1".into(), country: None, adm1: None, adm2: None },
            current: WeatherSnapshot::default(),
            forecast: vec![
                ForecastDay { uv_index: Some("5".into()), ..Default::default() },
                ForecastDay { uv_index: Some("2".into()), ..Default::default() },
            ],
        };
        assert_eq!(report.today_uv_index(), Some("5"));
    }
}
