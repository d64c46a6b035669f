//! Quarantine vault handlers (C3, §6): list, confirm, restore.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use integrity_vault::QuarantineRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuarantineParams {
    #[serde(default)]
    pub include_restored: Option<u8>,
}

/// Response envelope for `GET /api/quarantine`. Left untyped for OpenAPI
/// purposes (`QuarantineRecord` is an internal domain type, not an API DTO);
/// the JSON shape is `{quarantined: [QuarantineRecord]}` (§6).
#[derive(Debug, Serialize)]
pub struct QuarantineListResponse {
    pub quarantined: Vec<QuarantineRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuarantineActionRequest {
    pub analyst: String,
    pub notes: Option<String>,
}

pub fn quarantine_routes() -> Router<AppState> {
    Router::new()
        .route("/quarantine", get(list_quarantine))
        .route("/quarantine/:id/confirm", post(confirm_quarantine))
        .route("/quarantine/:id/restore", post(restore_quarantine))
}

/// `GET /api/quarantine` (§6). Excludes RESTORED records unless
/// `?include_restored=1`.
#[utoipa::path(
    get,
    path = "/api/quarantine",
    params(ListQuarantineParams),
    responses((status = 200, description = "Active quarantine records")),
    tag = "quarantine"
)]
pub async fn list_quarantine(State(state): State<AppState>, Query(params): Query<ListQuarantineParams>) -> Result<Json<QuarantineListResponse>, ApiError> {
    let include_restored = params.include_restored.unwrap_or(0) != 0;
    let quarantined = state.vault.list(include_restored).await?;
    Ok(Json(QuarantineListResponse { quarantined }))
}

/// `POST /api/quarantine/{id}/confirm` (§6). Valid only from QUARANTINED;
/// repeating on a terminal record fails with `INVALID_STATE` (P8).
#[utoipa::path(
    post,
    path = "/api/quarantine/{id}/confirm",
    request_body = QuarantineActionRequest,
    responses(
        (status = 204, description = "Confirmed as malicious"),
        (status = 404, description = "Quarantine record not found"),
        (status = 409, description = "Record is not in a confirmable state"),
    ),
    tag = "quarantine"
)]
pub async fn confirm_quarantine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<QuarantineActionRequest>,
) -> Result<StatusCode, ApiError> {
    state.vault.confirm(&id, &req.analyst, req.notes).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/quarantine/{id}/restore` (§6). Flips the document's
/// `is_quarantined` flag back (P4) and allows re-quarantine under a new id
/// on the next matching query (P7).
#[utoipa::path(
    post,
    path = "/api/quarantine/{id}/restore",
    request_body = QuarantineActionRequest,
    responses(
        (status = 204, description = "Restored"),
        (status = 404, description = "Quarantine record not found"),
        (status = 409, description = "Record is not in a restorable state"),
    ),
    tag = "quarantine"
)]
pub async fn restore_quarantine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<QuarantineActionRequest>,
) -> Result<StatusCode, ApiError> {
    state.vault.restore(&id, &req.analyst, req.notes).await?;
    Ok(StatusCode::NO_CONTENT)
}
