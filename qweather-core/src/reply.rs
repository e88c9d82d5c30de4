//! Plain-text weather reply.
//!
//! Composition is pure and total: any missing value is rendered as
//! [`PLACEHOLDER`] and malformed timestamps are shown verbatim.

use chrono::{DateTime, Datelike, NaiveDate};
use std::fmt::Write;

use crate::model::{ForecastDay, GeoResult, WeatherReport, WeatherSnapshot};

pub const PLACEHOLDER: &str = "N/A";
pub const BANNER: &str = "----- 天气助手提醒您关注天气 -----";
pub const INCOMPLETE_FORECAST_NOTICE: &str = "⚠️预报数据不完整";

/// Days after today shown in the outlook.
const OUTLOOK_DAYS: usize = 3;

pub fn compose_report(report: &WeatherReport) -> String {
    compose(&report.geo, &report.current, &report.forecast)
}

pub fn compose(geo: &GeoResult, current: &WeatherSnapshot, forecast: &[ForecastDay]) -> String {
    let today_uv = forecast.first().and_then(|d| d.uv_index.as_deref());
    let update_time = current
        .update_time
        .as_deref()
        .map(format_update_time)
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{BANNER}");
    let _ = writeln!(out, "{} 实时天气☁️", place_name(geo));
    let _ = writeln!(out, "⏰更新时间：{update_time}");
    out.push('\n');
    let _ = writeln!(out, "🌡️当前温度：{}℃", or_na(&current.temperature));
    let _ = writeln!(out, "🌡️体感温度：{}℃", or_na(&current.feels_like));
    let _ = writeln!(out, "☁️天气：{}", or_na(&current.condition_text));
    let _ = writeln!(out, "☀️紫外线指数：{}", today_uv.unwrap_or(PLACEHOLDER));
    let _ = writeln!(out, "🌬️风向：{}", or_na(&current.wind_direction));
    let _ = writeln!(out, "🌬️风力：{}级", or_na(&current.wind_scale));
    let _ = writeln!(out, "💦湿度：{}%", or_na(&current.humidity));
    let _ = writeln!(out, "🌧️降水量：{}mm/h", or_na(&current.precipitation));
    let _ = writeln!(out, "👀能见度：{}km", or_na(&current.visibility));
    out.push('\n');
    let _ = writeln!(out, "☁️未来{OUTLOOK_DAYS}天 {} 天气：", or_na(&geo.adm2));

    for day in forecast.iter().skip(1).take(OUTLOOK_DAYS) {
        let _ = writeln!(out, "{}", forecast_line(day));
    }

    if forecast.len() < 2 {
        let _ = writeln!(out, "{INCOMPLETE_FORECAST_NOTICE}");
    }

    out
}

fn forecast_line(day: &ForecastDay) -> String {
    let date = day
        .date
        .as_deref()
        .map(format_forecast_date)
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    format!(
        "{} {} 最高🌡️{}℃ 最低🌡️{}℃ ☀️紫外线:{}",
        date,
        or_na(&day.condition_text),
        or_na(&day.temp_max),
        or_na(&day.temp_min),
        or_na(&day.uv_index),
    )
}

fn place_name(geo: &GeoResult) -> String {
    let name: String = [&geo.country, &geo.adm1, &geo.adm2]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();

    if name.is_empty() { PLACEHOLDER.to_string() } else { name }
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(PLACEHOLDER)
}

/// `2023-10-26T10:35+08:00` → `10-26 10:35`, in the timestamp's own offset.
/// Anything unparseable is returned unchanged.
pub fn format_update_time(raw: &str) -> String {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// `2023-10-07` → `10.7`.
pub fn format_forecast_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| format!("{}.{}", d.month(), d.day()))
        .unwrap_or_else(|_| raw.to_string())
}
