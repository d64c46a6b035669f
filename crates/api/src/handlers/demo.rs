//! Demonstration reset handler (§6): DESTRUCTIVE, gated by configuration.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Router};
use integrity_core::Error;

pub fn demo_routes() -> Router<AppState> {
    Router::new().route("/demo/reset", post(reset))
}

/// `POST /api/demo/reset` (§6): clears events, lineage, vault, and index.
/// Disabled unless `config.pipeline.enable_demo_reset` is set; production
/// configuration refuses to start with this flag on
/// (`Config::validate_production_security`).
#[utoipa::path(
    post,
    path = "/api/demo/reset",
    responses(
        (status = 204, description = "All demo state cleared"),
        (status = 501, description = "Demo reset disabled by configuration"),
    ),
    tag = "demo"
)]
pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if !state.config.pipeline.enable_demo_reset {
        return Err(Error::new(integrity_core::ErrorCode::NotImplemented, "demo reset is disabled by configuration").into());
    }

    state.events.clear().await?;
    state.vault.clear().await?;
    state.adapter.clear().await?;
    state.lineage.clear().await?;

    Ok(StatusCode::NO_CONTENT)
}
