//! Request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use weatherman_core::WeatherService;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Errors surfaced to HTTP clients as plain text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing city in path, expected /weather/{{city}}")]
    MissingCity,

    /// The query failed; the full error chain is returned verbatim.
    #[error("{0:#}")]
    Query(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingCity => StatusCode::BAD_REQUEST,
            ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

pub async fn hello() -> &'static str {
    "hello!"
}

/// `GET /weather/{city}`: the city is everything after `/weather/`.
pub async fn weather(
    State(service): State<Arc<WeatherService>>,
    Path(city): Path<String>,
) -> Result<Response, ApiError> {
    if city.is_empty() {
        return Err(ApiError::MissingCity);
    }

    let result = service.query(&city).await.map_err(|err| {
        tracing::warn!(city = %city, "weather query failed: {err:#}");
        ApiError::Query(err)
    })?;

    tracing::info!(
        city = %result.city,
        temp = result.temperature_kelvin,
        took = ?result.elapsed,
        "weather query completed"
    );

    let body = serde_json::to_string(&result).map_err(|err| ApiError::Query(err.into()))?;
    Ok(([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}

/// Turns `/weather` and `/weather/` into a 400 instead of a 404.
pub async fn fallback(uri: Uri) -> Response {
    match uri.path() {
        "/weather" | "/weather/" => ApiError::MissingCity.into_response(),
        _ => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
