//! Metrics HTTP server.
//!
//! Exposes `/metrics` in the Prometheus text format and a `/_health` endpoint
//! that returns 200 OK.

use std::{net::SocketAddr, sync::Arc};

use axum::{Router, extract::State, http::header, response::IntoResponse, routing::get};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::metrics::Registry;

async fn health() -> &'static str {
    "OK"
}

async fn metrics(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let body = registry.expose().await;
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/_health", get(health))
        .with_state(registry)
}

/// Bind and serve the metrics server.
///
/// Collection happens inside request handling: every scrape of `/metrics`
/// runs the registered collectors. The server shuts down gracefully when the
/// `cancel` token is triggered.
pub async fn serve(
    addr: SocketAddr,
    registry: Arc<Registry>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(registry);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("metrics server listening on {addr}");

    axum::serve(listener, app).with_graceful_shutdown(cancel.cancelled_owned()).await?;

    Ok(())
}
