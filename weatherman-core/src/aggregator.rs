use anyhow::Result;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{WeatherError, provider::ProviderId, provider::WeatherProvider};

/// How the aggregator queries its providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanOut {
    /// One provider at a time, in order. Latency is the sum of all calls.
    #[default]
    Sequential,
    /// All providers at once. Latency is the slowest call.
    Concurrent,
}

/// Averages the temperature reported by a non-empty set of providers.
///
/// Aggregation is all-or-nothing: the first provider error aborts the query
/// and is returned as-is. With [`FanOut::Concurrent`] the calls still in
/// flight are dropped at that point.
#[derive(Debug, Clone)]
pub struct Aggregator {
    providers: Vec<Arc<dyn WeatherProvider>>,
    fan_out: FanOut,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(WeatherError::NoProviders.into());
        }

        Ok(Self {
            providers,
            fan_out: FanOut::default(),
        })
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn fan_out(&self) -> FanOut {
        self.fan_out
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Mean temperature for `city` across every provider, in Kelvin.
    pub async fn temperature(&self, city: &str) -> Result<f64> {
        let sum = match self.fan_out {
            FanOut::Sequential => {
                let mut sum = 0.0;
                for provider in &self.providers {
                    sum += provider.temperature(city).await?;
                }
                sum
            }
            FanOut::Concurrent => {
                let readings =
                    try_join_all(self.providers.iter().map(|p| p.temperature(city))).await?;
                readings.iter().sum()
            }
        };

        Ok(sum / self.providers.len() as f64)
    }
}
