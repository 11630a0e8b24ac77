use crate::{
    Config,
    model::{ForecastSample, WeatherSnapshot},
    provider::{openweather::OpenWeatherSource, weatherapi::WeatherApiSource},
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use thiserror::Error;

pub mod openweather;
pub mod weatherapi;

/// Failures reported by a weather source. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Service(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// Where current conditions and forecasts come from.
///
/// Both calls are keyed by the same city string. Implementations do not retry.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, SourceError>;

    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastSample>, SourceError>;
}

/// Construct a source from config and explicit ProviderId.
pub fn source_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherSource>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weatherdesk configure {id}` and enter your API key."
        )
    })?;

    let http = http_client(config.http_timeout())?;

    let boxed: Box<dyn WeatherSource> = match id {
        ProviderId::OpenWeather => Box::new(OpenWeatherSource::new(api_key.to_owned(), http)),
        ProviderId::WeatherApi => Box::new(WeatherApiSource::new(api_key.to_owned(), http)),
    };

    Ok(boxed)
}

/// Construct the default source from config, using `default_provider` field.
pub fn default_source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let id = config.default_provider_id()?;
    source_from_config(id, config)
}

fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("weatherdesk/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Map a non-success HTTP status to a [`SourceError`].
pub(crate) fn classify_status(
    provider: ProviderId,
    status: reqwest::StatusCode,
    city: &str,
    body: &str,
) -> SourceError {
    if status == reqwest::StatusCode::NOT_FOUND {
        SourceError::NotFound(format!(
            "City '{city}' not found. Please check the spelling."
        ))
    } else {
        SourceError::Service(format!(
            "{provider} request failed with status {status}: {}",
            truncate_body(body)
        ))
    }
}

pub(crate) fn network_error(provider: ProviderId, err: &reqwest::Error) -> SourceError {
    SourceError::Network(format!("Network error while contacting {provider}: {err}"))
}

pub(crate) fn parse_error(
    provider: ProviderId,
    what: &str,
    err: &serde_json::Error,
) -> SourceError {
    SourceError::Service(format!("Failed to parse {provider} {what} response: {err}"))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
