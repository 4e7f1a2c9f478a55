//! Monitor status endpoints
//!
//! `/healthz` folds the sampler, liveness and renderer components into one
//! status and only answers 503 once a component is unhealthy, which happens
//! when a liveness query or a graph save has failed. `/readyz` turns ready
//! after the first completed cycle. `/metrics` exposes the `netmon_*`
//! Prometheus series.

use crate::health::{ComponentStatus, HealthRegistry};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use tracing::{info, warn};

/// A down interface or a short window only degrades the monitor
async fn healthz(State(registry): State<HealthRegistry>) -> impl IntoResponse {
    let health = registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(registry): State<HealthRegistry>) -> impl IntoResponse {
    let readiness = registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

pub fn create_router(registry: HealthRegistry) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(registry)
}

/// Serve health and metrics until the task is dropped
pub async fn serve(port: u16, registry: HealthRegistry) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "Starting health/metrics server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, create_router(registry)).await
}
