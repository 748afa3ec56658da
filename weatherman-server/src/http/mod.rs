//! HTTP server module

mod api;

use anyhow::Context;
use axum::{Router, routing::get};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use weatherman_core::WeatherService;

/// Create the HTTP router with all routes configured
pub fn create_router(service: Arc<WeatherService>) -> Router {
    Router::new()
        .route("/", get(api::hello))
        .route("/weather/*city", get(api::weather))
        .fallback(api::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, service: Arc<WeatherService>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
    }
    tracing::info!("Shutdown signal received");
}
