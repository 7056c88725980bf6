// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Health, readiness and metrics HTTP endpoints.
//!
//! - `GET /health` - always 200 while the process is up
//! - `GET /ready` - 200 after the first successful reconciliation, 503 before
//! - `GET /metrics` - Prometheus text exposition of the [`Metrics`] registry

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use prometheus::TEXT_FORMAT;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::constants::{HEALTH_SERVER_PATH, METRICS_SERVER_PATH, READY_SERVER_PATH};
use crate::metrics::Metrics;
use crate::shutdown::{wait_for_shutdown, ShutdownReceiver};

/// Body of `/health` and `/ready`.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatusResponse {
    /// `healthy`, `ready` or `not ready`
    pub status: String,
    /// Current time (RFC 3339)
    pub timestamp: String,
}

impl StatusResponse {
    fn now(status: &str) -> Json<Self> {
        Json(Self {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}

/// Build the router for all three endpoints.
pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route(HEALTH_SERVER_PATH, get(health))
        .route(READY_SERVER_PATH, get(ready))
        .route(METRICS_SERVER_PATH, get(metrics_text))
        .with_state(metrics)
}

/// Liveness: the process is running.
async fn health() -> impl IntoResponse {
    (StatusCode::OK, StatusResponse::now("healthy"))
}

/// Readiness: the first reconciliation pass has succeeded.
async fn ready(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    if metrics.is_ready() {
        (StatusCode::OK, StatusResponse::now("ready"))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            StatusResponse::now("not ready"),
        )
    }
}

async fn metrics_text(State(metrics): State<Arc<Metrics>>) -> Response {
    match metrics.gather_metrics() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve the endpoints on `listener` until shutdown is requested.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve(
    listener: TcpListener,
    metrics: Arc<Metrics>,
    mut shutdown: ShutdownReceiver,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Starting metrics server");
    }

    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move { wait_for_shutdown(&mut shutdown).await })
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
