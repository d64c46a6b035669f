//! Process status handler (§6): a lightweight summary of corpus and vault
//! size, used for dashboards and smoke tests.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub documents_indexed: usize,
    pub vault_size: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

pub fn status_routes() -> Router<AppState> {
    Router::new().route("/status", get(status))
}

/// `GET /api/status` (§6).
#[utoipa::path(
    get,
    path = "/api/status",
    responses((status = 200, description = "Process status summary", body = StatusResponse)),
    tag = "status"
)]
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let documents_indexed = state.adapter.len().await?;
    let vault_size = state.vault.list(true).await?.len();
    let uptime_seconds = state.started_at.elapsed().as_secs();

    Ok(Json(StatusResponse {
        documents_indexed,
        vault_size,
        uptime_seconds,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
