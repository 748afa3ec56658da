use anyhow::Result;
use std::time::Instant;

use crate::{Aggregator, Config, WeatherResult, provider::providers_from_config};

/// Runs one timed aggregation per query.
#[derive(Debug, Clone)]
pub struct WeatherService {
    aggregator: Aggregator,
}

impl WeatherService {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    /// Build the provider set described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = providers_from_config(config)?;
        let aggregator = Aggregator::new(providers)?.with_fan_out(config.fan_out);
        Ok(Self::new(aggregator))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub async fn query(&self, city: &str) -> Result<WeatherResult> {
        let begin = Instant::now();
        let temperature_kelvin = self.aggregator.temperature(city).await?;

        Ok(WeatherResult {
            city: city.to_string(),
            temperature_kelvin,
            elapsed: begin.elapsed(),
        })
    }
}
