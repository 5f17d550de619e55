//! HTTP transport for the analysis service.
//!
//! `POST /analyze` accepts a multipart upload and returns the orchestrator's
//! outcome as JSON; `GET /health` reports converter and storage status;
//! `GET /` is a banner. Analysis is CPU-bound and runs on tokio's blocking
//! pool behind a concurrency limit of `server.workers`.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, StorageConfig};
use crate::orchestrator::RequestOrchestrator;
use crate::startup;

pub use routes::{status_for, HomeResponse};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
    pub storage: Arc<StorageConfig>,
}

impl AppState {
    pub fn new(orchestrator: RequestOrchestrator, storage: StorageConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            storage: Arc::new(storage),
        }
    }
}

/// Build the router with all handlers
pub fn build_router(state: AppState, workers: usize) -> Router {
    let body_limit = state.orchestrator.max_upload_bytes();

    Router::new()
        .route(
            "/analyze",
            post(routes::analyze).layer(ConcurrencyLimitLayer::new(workers.max(1))),
        )
        .route("/health", get(routes::health))
        .route("/", get(routes::home))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    startup::prepare_directories(&config.storage)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "parsing listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let orchestrator = RequestOrchestrator::from_config(&config);
    if !orchestrator.converter().is_available() {
        log::warn!(
            "[HTTP] Converter '{}' is not available; uploads will fail with ConversionError",
            orchestrator.converter().name()
        );
    }

    let state = AppState::new(orchestrator, config.storage.clone());
    let router = build_router(state, config.server.workers);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    log::info!(
        "[HTTP] Listening on {} ({} workers, {} byte upload limit)",
        addr,
        config.server.workers,
        config.server.max_upload_bytes
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP router")?;

    log::info!("[HTTP] Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("[HTTP] Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("[HTTP] Shutdown signal received");
}

#[cfg(test)]
mod tests;
