use reqwest::StatusCode;
use thiserror::Error;

use crate::provider::ProviderId;

/// Typed failures raised by the core. They travel through `anyhow` and can be
/// recovered with `downcast_ref` where a caller needs to branch on them.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("No weather providers configured; at least one provider is required")]
    NoProviders,

    #[error(
        "No API key configured for provider '{0}'.\n\
         Hint: run `weatherman configure {0}` and enter your API key."
    )]
    MissingApiKey(ProviderId),

    #[error("{provider} request failed with status {status}: {body}")]
    UnexpectedStatus {
        provider: ProviderId,
        status: StatusCode,
        body: String,
    },

    #[error("Unknown provider '{0}'. Supported providers: openweather, wunderground.")]
    UnknownProvider(String),
}
