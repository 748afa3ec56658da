//! Core library for the `weatherman` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers
//! - The aggregator averaging provider temperatures
//! - The query orchestrator producing timed results
//!
//! It is used by `weatherman-server`, but can also be reused by other binaries or services.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;

pub use aggregator::{Aggregator, FanOut};
pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use model::WeatherResult;
pub use provider::{ProviderId, WeatherProvider};
pub use service::WeatherService;
