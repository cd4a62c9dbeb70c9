//! HTTP server for Prometheus metrics endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::exposition::{CONTENT_TYPE, render};
use crate::registry::SharedRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    registry: SharedRegistry,
}

/// Path of the liveness endpoint; the metrics path may not reuse it.
pub const HEALTH_PATH: &str = "/health";

/// Create the HTTP router.
fn create_router(registry: SharedRegistry, metrics_path: &str) -> Router {
    let state = AppState { registry };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route(HEALTH_PATH, get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint. Every request runs a fresh scrape.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let samples = state.registry.gather().await;
    debug!(samples = samples.len(), "Serving metrics");

    (
        StatusCode::OK,
        [("content-type", CONTENT_TYPE)],
        render(&samples),
    )
        .into_response()
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    registry: SharedRegistry,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(registry: SharedRegistry, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            registry,
            listen_addr,
            metrics_path,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.registry, &self.metrics_path);

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        info!(
            addr = %self.listen_addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        // Run server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
