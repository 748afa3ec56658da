use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::model::celsius_to_kelvin;

use super::{ProviderId, WeatherProvider, fetch_json};

pub const DEFAULT_ENDPOINT: &str = "http://api.wunderground.com/api";

/// Weather Underground conditions API. Reports Celsius, converted to Kelvin.
#[derive(Debug, Clone)]
pub struct WundergroundProvider {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl WundergroundProvider {
    pub fn new(api_key: String, endpoint: String, http: Client) -> Self {
        Self {
            api_key,
            endpoint,
            http,
        }
    }

    /// `<endpoint>/<key>/conditions/q/<city>.json`, with the key and city
    /// percent-encoded as single path segments.
    fn conditions_url(&self, city: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid wunderground endpoint: {}", self.endpoint))?;

        url.path_segments_mut()
            .map_err(|()| anyhow!("wunderground endpoint cannot be a base URL: {}", self.endpoint))?
            .pop_if_empty()
            .extend([
                self.api_key.as_str(),
                "conditions",
                "q",
                format!("{city}.json").as_str(),
            ]);

        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct WuObservation {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WuConditionsResponse {
    current_observation: WuObservation,
}

#[async_trait]
impl WeatherProvider for WundergroundProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Wunderground
    }

    async fn temperature(&self, city: &str) -> Result<f64> {
        let request = self.http.get(self.conditions_url(city)?);
        let parsed: WuConditionsResponse = fetch_json(self.id(), request).await?;

        let kelvin = celsius_to_kelvin(parsed.current_observation.temp_c);
        tracing::debug!(provider = %self.id(), city, kelvin, "wunderground temperature");

        Ok(kelvin)
    }
}
