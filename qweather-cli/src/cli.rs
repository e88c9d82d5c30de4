use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::Text;
use qweather_core::{
    CommandParser, Config, QWeatherClient, TokenCache, WeatherPlugin, WeatherProvider,
    command::DEFAULT_TRIGGER, compose_report, provider::provider_from_config,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "QWeather chat plugin host")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Word that marks a chat message as a weather command.
    #[arg(long, global = true, default_value = DEFAULT_TRIGGER)]
    pub trigger: String,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store API host, signing key and JWT identity.
    Configure,

    /// Handle one chat message, e.g. `weather ask 天气 北京`.
    Ask {
        /// Message text; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Show weather for a place name, bypassing command parsing.
    Show {
        /// Place name, at most 20 characters.
        location: String,
    },

    /// Mint an API token with the configured identity and print it.
    Token,

    /// Read chat messages from stdin, one per line, and answer each
    /// concurrently.
    Listen,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(self.config.as_deref()),
            Command::Ask { message } => {
                let plugin = load_plugin(self.config.as_deref(), &self.trigger)?;
                match plugin.handle(&message.join(" ")).await {
                    Some(reply) => println!("{reply}"),
                    None => tracing::info!("message ignored: not a weather command"),
                }
                Ok(())
            }
            Command::Show { location } => {
                let provider = load_provider(self.config.as_deref())?;
                let report = provider.fetch_weather(&location).await?;
                println!("{}", compose_report(&report));
                Ok(())
            }
            Command::Token => print_token(self.config.as_deref()),
            Command::Listen => {
                let plugin = load_plugin(self.config.as_deref(), &self.trigger)?;
                listen(plugin).await
            }
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(p) => Config::load_from(p)?,
        None => Config::load()?,
    };
    cfg.apply_env();
    Ok(cfg)
}

fn load_provider(path: Option<&std::path::Path>) -> Result<Arc<dyn WeatherProvider>> {
    let cfg = load_config(path)?;
    Ok(provider_from_config(&cfg)?)
}

fn load_plugin(path: Option<&std::path::Path>, trigger: &str) -> Result<WeatherPlugin> {
    let provider = load_provider(path)?;
    Ok(WeatherPlugin::with_parser(CommandParser::with_trigger(trigger), provider))
}

fn print_token(path: Option<&std::path::Path>) -> Result<()> {
    let settings = load_config(path)?.validate()?;
    let client = QWeatherClient::new(&settings, Arc::new(TokenCache::new(settings.refresh_lead)))?;
    let cred = client.credential()?;

    println!("{}", cred.token);
    println!("iat: {} ({})", cred.issued_at.timestamp(), cred.issued_at.with_timezone(&Local));
    println!("exp: {} ({})", cred.expires_at.timestamp(), cred.expires_at.with_timezone(&Local));
    Ok(())
}

async fn listen(plugin: WeatherPlugin) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    tracing::info!("listening for messages on stdin");

    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let plugin = plugin.clone();
        tasks.spawn(async move {
            if let Some(reply) = plugin.handle(&line).await {
                println!("{reply}");
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            tracing::error!(error = %e, "message task panicked");
        }
    }

    Ok(())
}

fn configure(path: Option<&std::path::Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::config_file_path()?,
    };
    let mut cfg = Config::load_from(&path)?;
    let api = &mut cfg.qweather;

    let host = Text::new("API host:")
        .with_default(api.api_host.as_deref().unwrap_or("https://devapi.qweather.com"))
        .prompt()?;

    let key_file = Text::new("Path to Ed25519 private key (PEM):")
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;

    let kid = Text::new("Credential ID (jwt kid):")
        .with_default(api.jwt_kid.as_deref().unwrap_or_default())
        .prompt()?;

    let sub = Text::new("Project ID (jwt sub):")
        .with_default(api.jwt_sub.as_deref().unwrap_or_default())
        .prompt()?;

    api.api_host = Some(host.trim().to_string());
    api.jwt_kid = Some(kid.trim().to_string());
    api.jwt_sub = Some(sub.trim().to_string());
    if !key_file.trim().is_empty() {
        let pem = std::fs::read_to_string(key_file.trim())
            .with_context(|| format!("Failed to read private key: {}", key_file.trim()))?;
        api.api_key = Some(pem);
    }

    cfg.validate()?;
    cfg.save_to(&path)?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_joins_message_words() {
        let cli = Cli::try_parse_from(["weather", "ask", "天气", "北京"]).unwrap();
        match cli.command {
            Command::Ask { message } => assert_eq!(message.join(" "), "天气 北京"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["weather", "show", "上海", "--config", "/tmp/q.toml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.trigger, DEFAULT_TRIGGER);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/q.toml")));
        assert!(matches!(cli.command, Command::Show { ref location } if location == "上海"));
    }
}
