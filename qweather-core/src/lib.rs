//! Core library for the QWeather chat plugin.
//!
//! This crate defines:
//! - Configuration & signing identity handling
//! - EdDSA JWT minting with a single-slot, proactively renewed token cache
//! - The geocode → now → 7-day forecast call pipeline
//! - Reply composition and trigger-word command parsing
//!
//! It is used by `qweather-cli`, but any chat host can drive [`WeatherPlugin`].

pub mod auth;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod plugin;
pub mod provider;
pub mod reply;

pub use auth::{Credential, EdDsaSigner, SigningIdentity, TokenCache, TokenSigner};
pub use command::{Command, CommandParser, Segmenter, SimpleSegmenter};
pub use config::{Config, Settings};
pub use error::{Stage, WeatherError};
pub use model::{ForecastDay, ForecastSet, GeoResult, LocationQuery, WeatherReport, WeatherSnapshot};
pub use plugin::WeatherPlugin;
pub use provider::{WeatherProvider, qweather::QWeatherClient};
pub use reply::{compose, compose_report};
