//! Blast-radius analyzer handler (C8, §4.8, §6).

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Duration;
use integrity_pipeline::BlastRadiusReport;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct BlastRadiusParams {
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
}

fn default_window_hours() -> i64 {
    24
}

pub fn blast_radius_routes() -> Router<AppState> {
    Router::new().route("/blast-radius/:doc_id", get(blast_radius))
}

/// `GET /api/blast-radius/{doc_id}?window_hours=24` (§6). Scans the
/// query-lineage store for queries that retrieved `doc_id` within the
/// window and reports the table-driven severity (§4.8).
#[utoipa::path(
    get,
    path = "/api/blast-radius/{doc_id}",
    params(BlastRadiusParams),
    responses((status = 200, description = "Blast-radius report")),
    tag = "blast_radius"
)]
pub async fn blast_radius(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Query(params): Query<BlastRadiusParams>,
) -> Result<Json<BlastRadiusReport>, ApiError> {
    let window = Duration::hours(params.window_hours.max(0));
    let report = state.blast_radius.analyze(&doc_id, window).await?;
    Ok(Json(report))
}
