use crate::{
    Config, ProviderConfig, WeatherError,
    provider::{openweather::OpenWeatherProvider, wunderground::WundergroundProvider},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openweather;
pub mod wunderground;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Wunderground,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Wunderground => "wunderground",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::Wunderground]
    }

    /// Whether the upstream refuses requests without an API key.
    pub fn requires_api_key(&self) -> bool {
        match self {
            ProviderId::OpenWeather => false,
            ProviderId::Wunderground => true,
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => openweather::DEFAULT_ENDPOINT,
            ProviderId::Wunderground => wunderground::DEFAULT_ENDPOINT,
        }
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
            "wunderground" => Ok(ProviderId::Wunderground),
            _ => Err(WeatherError::UnknownProvider(value.to_string()).into()),
        }
    }
}

/// A single upstream source of temperature readings.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Current temperature for `city`, in Kelvin.
    async fn temperature(&self, city: &str) -> Result<f64>;
}

/// Construct a provider from its config section, sharing `http` between providers.
pub fn provider_from_config(
    id: ProviderId,
    settings: &ProviderConfig,
    http: Client,
) -> Result<Arc<dyn WeatherProvider>> {
    let endpoint = settings
        .endpoint
        .clone()
        .unwrap_or_else(|| id.default_endpoint().to_string());
    let api_key = settings.api_key.clone().filter(|key| !key.is_empty());

    let provider: Arc<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => Arc::new(OpenWeatherProvider::new(api_key, endpoint, http)),
        ProviderId::Wunderground => {
            let api_key = api_key.ok_or(WeatherError::MissingApiKey(id))?;
            Arc::new(WundergroundProvider::new(api_key, endpoint, http))
        }
    };

    Ok(provider)
}

/// Construct every active provider from config, in `ProviderId::all()` order.
pub fn providers_from_config(config: &Config) -> Result<Vec<Arc<dyn WeatherProvider>>> {
    let http = Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    config
        .active_provider_ids()?
        .into_iter()
        .map(|id| {
            let settings = config.provider_config(id).cloned().unwrap_or_default();
            provider_from_config(id, &settings, http.clone())
        })
        .collect()
}

/// Send `request`, read the whole body, then decode it as JSON.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {provider}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {provider} response body"))?;

    if !status.is_success() {
        return Err(WeatherError::UnexpectedStatus {
            provider,
            status,
            body: truncate_body(&body),
        }
        .into());
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {provider} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
