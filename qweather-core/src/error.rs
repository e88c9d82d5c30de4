//! Error taxonomy for the weather pipeline.
//!
//! Every variant is logged in full by the plugin and then collapsed into a
//! single user-facing line via [`WeatherError::user_message`].

use std::fmt;

use thiserror::Error;

/// One of the three remote calls made per weather lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Geocode,
    Now,
    Forecast,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Geocode => "geocode",
            Stage::Now => "now",
            Stage::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to sign API token: {0}")]
    Signing(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Non-200 HTTP status or non-"200" application code.
    #[error("{stage} request rejected by provider (http {status}, code {}): {message}", .code.as_deref().unwrap_or("-"))]
    Upstream {
        stage: Stage,
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("{stage} response could not be decoded: {message}")]
    ResponseFormat { stage: Stage, message: String },

    #[error("{stage} request failed: {source}")]
    Network {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WeatherError {
    /// Short notice suitable for sending back to the chat.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(_) => "⚠️城市名称无效，请输入1-20个字符的城市名".to_string(),
            Self::LocationNotFound(_) => "⚠️查无此地！".to_string(),
            Self::Signing(_) | Self::Config(_) => "⚠️天气服务配置有误，请联系管理员".to_string(),
            Self::Upstream { stage: Stage::Geocode, .. } => "⚠️请求失败，请稍后重试".to_string(),
            Self::Upstream { stage: Stage::Now, .. } => "⚠️获取天气信息失败，请稍后重试".to_string(),
            Self::Upstream { stage: Stage::Forecast, .. } => {
                "⚠️获取天气预报失败，请稍后重试".to_string()
            }
            Self::ResponseFormat { .. } => "⚠️天气服务返回了无法识别的数据".to_string(),
            Self::Network { .. } => "⚠️网络异常，请稍后重试".to_string(),
        }
    }

    /// The pipeline stage this error came from, if it came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Upstream { stage, .. }
            | Self::ResponseFormat { stage, .. }
            | Self::Network { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_hide_internal_details() {
        let err = WeatherError::Upstream {
            stage: Stage::Now,
            status: 200,
            code: Some("401".into()),
            message: "{\"code\":\"401\"}".into(),
        };
        let msg = err.user_message();
        assert!(msg.contains("天气信息"));
        assert!(!msg.contains("401"));

        let err = WeatherError::LocationNotFound("nowhere".into());
        assert_eq!(err.user_message(), "⚠️查无此地！");
    }

    #[test]
    fn display_includes_stage_and_code() {
        let err = WeatherError::Upstream {
            stage: Stage::Geocode,
            status: 200,
            code: Some("403".into()),
            message: "forbidden".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("geocode"));
        assert!(text.contains("code 403"));
        assert!(text.contains("forbidden"));
    }

    #[test]
    fn stage_is_reported_only_for_pipeline_errors() {
        let err = WeatherError::ResponseFormat { stage: Stage::Forecast, message: "x".into() };
        assert_eq!(err.stage(), Some(Stage::Forecast));
        assert_eq!(WeatherError::InvalidInput("".into()).stage(), None);
    }
}
