use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ProviderId, WeatherProvider, fetch_json};

pub const DEFAULT_ENDPOINT: &str = "http://api.openweathermap.org/data/2.5/weather";

/// OpenWeatherMap current conditions. Reports Kelvin natively.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    endpoint: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>, endpoint: String, http: Client) -> Self {
        Self {
            api_key,
            endpoint,
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn temperature(&self, city: &str) -> Result<f64> {
        let mut query = vec![("q", city)];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("appid", key));
        }

        let request = self.http.get(&self.endpoint).query(&query);
        let parsed: OwCurrentResponse = fetch_json(self.id(), request).await?;

        let kelvin = parsed.main.temp;
        tracing::debug!(provider = %self.id(), city, kelvin, "openweather temperature");

        Ok(kelvin)
    }
}
