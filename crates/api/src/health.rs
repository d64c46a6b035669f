//! Health check endpoints for load balancers and orchestration probes.
//!
//! - `/health` (liveness): always 200 if the process is responsive.
//! - `/ready` (readiness): probes the index and event sinks are reachable.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy")),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "integrity-gate",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready"),
    ),
    tag = "health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let index_healthy = match state.adapter.len().await {
        Ok(_) => true,
        Err(e) => {
            error!("retrieval index health check failed: {}", e);
            false
        }
    };

    let events_healthy = match state.events.recent(1).await {
        Ok(_) => true,
        Err(e) => {
            error!("event bus health check failed: {}", e);
            false
        }
    };

    let is_ready = index_healthy && events_healthy;
    let status = if is_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "ready": is_ready,
            "checks": {
                "index": index_healthy,
                "events": events_healthy,
            }
        })),
    )
}
