//! Query handlers: the protected pipeline (§4.7) and its gated unsafe bypass.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::State,
    response::Json,
    routing::{post, Router},
};
use integrity_core::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    pub query: String,
    pub user_id: String,
    /// Number of documents to return. Defaults to `config.retrieval.default_k`.
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IntegritySignalsDto {
    pub trust_score: f64,
    pub red_flag_score: f64,
    pub anomaly_score: f64,
    pub semantic_drift_score: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    pub answer: String,
    pub integrity_signals: HashMap<String, IntegritySignalsDto>,
    pub retrieved_docs: Vec<String>,
    pub quarantined_docs: Vec<String>,
    pub query_id: String,
}

impl From<integrity_pipeline::QueryOutcome> for QueryResponse {
    fn from(outcome: integrity_pipeline::QueryOutcome) -> Self {
        let integrity_signals = outcome
            .signals_by_doc
            .into_iter()
            .map(|(doc_id, s)| {
                (
                    doc_id,
                    IntegritySignalsDto {
                        trust_score: s.trust,
                        red_flag_score: s.red_flag,
                        anomaly_score: s.anomaly,
                        semantic_drift_score: s.semantic_drift,
                    },
                )
            })
            .collect();

        Self {
            answer: outcome.answer,
            integrity_signals,
            retrieved_docs: outcome.retrieved_doc_ids,
            quarantined_docs: outcome.quarantined_doc_ids,
            query_id: outcome.query_id,
        }
    }
}

pub fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(run_query))
        .route("/query/unsafe", post(run_query_unsafe))
}

/// `POST /api/query` (§6). Runs the full integrity pipeline: preprocessing,
/// retrieval, scoring, quarantine, and generation.
#[utoipa::path(
    post,
    path = "/api/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query answered", body = QueryResponse),
        (status = 400, description = "Empty query"),
        (status = 503, description = "Retrieval failure"),
        (status = 504, description = "Query deadline exceeded"),
    ),
    tag = "query"
)]
pub async fn run_query(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Result<Json<QueryResponse>, ApiError> {
    if req.query.trim().is_empty() {
        return Err(Error::empty_query().into());
    }
    let k = req.k.unwrap_or(state.config.retrieval.default_k);
    let outcome = state.pipeline.query(&req.query, &req.user_id, k).await?;
    Ok(Json(outcome.into()))
}

/// `POST /api/query/unsafe` (§6, §4.7 note). Skips scoring and quarantine
/// entirely. MUST be disabled unless `config.pipeline.enable_unsafe_endpoint`
/// is set — this is a demonstration surface for showing what the protected
/// path prevents, not a production code path.
#[utoipa::path(
    post,
    path = "/api/query/unsafe",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query answered without integrity checks", body = QueryResponse),
        (status = 400, description = "Empty query"),
        (status = 501, description = "Unsafe endpoint disabled by configuration"),
    ),
    tag = "query"
)]
pub async fn run_query_unsafe(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Result<Json<QueryResponse>, ApiError> {
    if !state.config.pipeline.enable_unsafe_endpoint {
        return Err(Error::new(integrity_core::ErrorCode::NotImplemented, "the unsafe query endpoint is disabled by configuration").into());
    }
    if req.query.trim().is_empty() {
        return Err(Error::empty_query().into());
    }
    let k = req.k.unwrap_or(state.config.retrieval.default_k);
    let outcome = state.pipeline.query_unsafe(&req.query, &req.user_id, k).await?;
    Ok(Json(outcome.into()))
}
