use std::sync::Arc;

use crate::{
    command::{Command, CommandParser},
    provider::WeatherProvider,
    reply::compose_report,
};

pub const USAGE_HINT: &str = "请指定城市名称，例如：天气 北京";

/// Chat-facing entry point: message text in, reply text out.
///
/// Cloning is cheap; clones share the provider (and with it the token
/// cache), so one instance can serve concurrently spawned message tasks.
#[derive(Debug, Clone)]
pub struct WeatherPlugin {
    parser: Arc<CommandParser>,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherPlugin {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self::with_parser(CommandParser::default(), provider)
    }

    pub fn with_parser(parser: CommandParser, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { parser: Arc::new(parser), provider }
    }

    /// `None` when the message is not addressed to this plugin.
    pub async fn handle(&self, text: &str) -> Option<String> {
        match self.parser.parse(text) {
            Command::NotForUs => None,
            Command::MissingLocation => Some(USAGE_HINT.to_string()),
            Command::Lookup(query) => Some(self.lookup(&query.raw_text).await),
        }
    }

    /// Run the pipeline for a location and return the reply or a one-line
    /// failure notice.
    pub async fn lookup(&self, location: &str) -> String {
        match self.provider.fetch_weather(location).await {
            Ok(report) => compose_report(&report),
            Err(err) => {
                tracing::warn!(location, error = %err, "weather lookup failed");
                err.user_message()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeatherError;
    use crate::model::{ForecastDay, GeoResult, WeatherReport, WeatherSnapshot};
    use crate::reply::BANNER;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct FakeProvider {
        seen: Mutex<Vec<String>>,
        not_found: bool,
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_weather(&self, location_text: &str) -> Result<WeatherReport, WeatherError> {
            self.seen.lock().push(location_text.to_string());
            if self.not_found {
                return Err(WeatherError::LocationNotFound(location_text.to_string()));
            }
            Ok(WeatherReport {
                geo: GeoResult {
                    city_id: "101280101".into(),
                    country: Some("中国".into()),
                    adm1: Some("广东省".into()),
                    adm2: Some("广州".into()),
                },
                current: WeatherSnapshot { temperature: Some("28".into()), ..Default::default() },
                forecast: vec![ForecastDay::default(); 4],
            })
        }
    }

    #[tokio::test]
    async fn ignores_unrelated_messages() {
        let provider = Arc::new(FakeProvider::default());
        let plugin = WeatherPlugin::new(provider.clone());

        assert_eq!(plugin.handle("早上好").await, None);
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn trigger_alone_returns_usage_hint() {
        let provider = Arc::new(FakeProvider::default());
        let plugin = WeatherPlugin::new(provider.clone());

        assert_eq!(plugin.handle("天气").await.as_deref(), Some(USAGE_HINT));
        assert!(provider.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn lookup_composes_reply() {
        let provider = Arc::new(FakeProvider::default());
        let plugin = WeatherPlugin::new(provider.clone());

        let reply = plugin.handle("天气 广州").await.expect("should reply");

        assert!(reply.starts_with(BANNER));
        assert!(reply.contains("中国广东省广州"));
        assert!(reply.contains("28℃"));
        assert_eq!(*provider.seen.lock(), vec!["广州".to_string()]);
    }

    #[tokio::test]
    async fn failures_become_user_messages() {
        let provider = Arc::new(FakeProvider { not_found: true, ..Default::default() });
        let plugin = WeatherPlugin::new(provider);

        let reply = plugin.handle("天气 亚特兰蒂斯").await.expect("should reply");
        assert_eq!(reply, "⚠️查无此地！");
    }
}
