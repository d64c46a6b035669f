//! # Integrity Gate API Server
//!
//! This is the main HTTP server for the integrity-gated retrieval pipeline,
//! built with Axum for high-performance async request handling. The server
//! exposes:
//!
//! ## Core Features
//!
//! - **Protected query pipeline**: preprocessing, retrieval, parallel
//!   four-signal scoring, quarantine, and generation (§4.7)
//! - **Quarantine vault workflow**: list, confirm, restore (§4.3, §6)
//! - **Blast-radius analysis**: on-demand impact reports over the
//!   query-lineage log (§4.8)
//! - **Live event feed**: recent events and an SSE subscription (§4.1)
//! - **Interactive API docs**: Swagger UI with a full OpenAPI specification
//! - **Security middleware**: CORS, security headers, request ID tracking
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │   Client    │    │ API Server   │    │ Integrity        │
//! │             │────│              │────│ Pipeline         │
//! │ - Dashboard │    │ - Axum HTTP  │    │ - Vault/Scoring  │
//! │ - Analyst   │    │ - Middleware │    │ - Retrieval      │
//! │ - SSE feed  │    │ - Validation │    │ - Blast radius   │
//! └─────────────┘    └──────────────┘    └─────────────────┘
//! ```
//!
//! ## Middleware Stack
//!
//! Requests flow through middleware in this order:
//! 1. **Security Headers**: HSTS, CSP, X-Frame-Options
//! 2. **Request ID**: Unique tracking for request tracing
//! 3. **Tracing**: Structured logging with correlation IDs
//! 4. **Compression**: Gzip/Brotli response compression
//! 5. **CORS**: Cross-origin resource sharing policies
//!
//! ## Usage
//!
//! Start the server:
//! ```bash
//! cargo run --bin integrity-server
//! ```
//!
//! The server will be available at:
//! - **API**: http://localhost:8080/api/
//! - **Health**: http://localhost:8080/health
//! - **Docs**: http://localhost:8080/swagger-ui

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use integrity_core::{Config, CorsConfig};
use integrity_pipeline::{BlastRadiusAnalyzer, IntegrityPipeline, TemplateGenerator};
use integrity_retrieval::{Embedder, HashingEmbedder, Index, InMemoryIndex, RetrievalAdapter};
use integrity_scoring::{GoldenCorpus, RedFlagTable, ScorerSet, TrustTable};
use integrity_vault::{DocumentStore, FileVaultRepository, VaultService};
use std::{net::SocketAddr, sync::Arc, time::Duration, time::Instant};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use axum::http::{HeaderName, HeaderValue, Method};
use tracing::{error, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api_middleware;
mod error;
mod error_handler;
mod handlers;
mod health;
mod state;

use crate::{
    handlers::{blast_radius, demo, events, query, quarantine, status},
    state::AppState,
};

/// Builds a CORS layer from configuration settings.
///
/// This function creates a tower-http CORS layer based on the application's
/// CORS configuration. It supports both permissive development settings
/// and restrictive production policies.
///
/// # Security Notes
///
/// - Production should never use "*" for allowed origins
///   (`Config::validate_production_security` already refuses to start
///   otherwise)
/// - Credentials should only be enabled with specific origins
fn build_cors_layer(cors_config: &CorsConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Result<Vec<HeaderValue>, _> = cors_config.allowed_origins.iter().map(|origin| origin.parse()).collect();
        cors = cors.allow_origin(origins?);
    }

    if cors_config.allowed_methods.contains(&"*".to_string()) {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Result<Vec<Method>, _> = cors_config.allowed_methods.iter().map(|method| method.parse()).collect();
        cors = cors.allow_methods(methods?);
    }

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Result<Vec<HeaderName>, _> = cors_config.allowed_headers.iter().map(|header| header.parse()).collect();
        cors = cors.allow_headers(headers?);
    }

    cors = cors.allow_credentials(cors_config.allow_credentials);

    Ok(cors)
}

#[tokio::main]
async fn main() {
    init_tracing();
    info!("starting integrity gate server...");

    let config = match Config::load() {
        Ok(config) => {
            info!("configuration loaded successfully");
            config
        }
        Err(err) => {
            error!("configuration error: {}", err);
            std::process::exit(2);
        }
    };

    let state = match build_state(config.clone()).await {
        Ok(state) => state,
        Err(err) => {
            error!("startup failed: {}", err);
            std::process::exit(1);
        }
    };

    let app = match create_app(state, &config) {
        Ok(app) => app,
        Err(err) => {
            error!("failed to build router: {}", err);
            std::process::exit(1);
        }
    };

    let addr = SocketAddr::from((config.server.host.parse::<std::net::IpAddr>().unwrap_or([0, 0, 0, 0].into()), config.server.port));
    info!("server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(config.server.shutdown_grace_seconds)).await {
        error!("server error: {}", err);
        std::process::exit(1);
    }

    info!("server shutdown complete");
}

/// Wires the collaborator chain in initialization order (§9): event bus and
/// logger first (everything else publishes through it), then lineage, then
/// the vault and retrieval adapter (which the pipeline and blast-radius
/// analyzer both depend on), then the scorer set, then the pipeline and
/// blast-radius analyzer, then the shared application state.
async fn build_state(config: Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let events: Arc<dyn integrity_core::EventBus> = Arc::new(integrity_core::FileEventBus::new(config.storage.events_path()).await?);
    info!("event bus initialized");

    let lineage: Arc<dyn integrity_core::LineageStore> = Arc::new(integrity_core::FileLineageStore::new(config.storage.lineage_path()).await?);
    info!("lineage store initialized");

    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder);
    let index: Arc<dyn Index> = Arc::new(InMemoryIndex::new());
    let adapter = Arc::new(RetrievalAdapter::new(embedder.clone(), index, config.retrieval.overfetch_factor));
    info!("retrieval adapter initialized");

    let vault_repository = Arc::new(FileVaultRepository::new(config.storage.vault_path()).await?);
    let documents: Arc<dyn DocumentStore> = adapter.clone();
    let vault = Arc::new(VaultService::new(vault_repository, documents, events.clone()));
    info!("vault service initialized");

    let golden_texts = load_golden_corpus(&config.scoring.golden_corpus_path).await;
    let golden_corpus = if golden_texts.is_empty() { GoldenCorpus::empty() } else { GoldenCorpus::build(&embedder, &golden_texts).await? };

    let trust_table = TrustTable::new(config.scoring.trust_table.clone());
    let red_flag_table = RedFlagTable::new(config.scoring.red_flag_categories.clone());
    let scorer_set = Arc::new(ScorerSet::new(trust_table, red_flag_table, golden_corpus, embedder.clone(), config.scoring.theta, config.scoring.quorum));
    info!("scorer set initialized");

    let generator: Arc<dyn integrity_pipeline::Generator> = Arc::new(TemplateGenerator);
    let pipeline = Arc::new(IntegrityPipeline::new(
        adapter.clone(),
        vault.clone(),
        scorer_set,
        generator,
        events.clone(),
        lineage.clone(),
        config.retrieval.boost_factor,
        Duration::from_secs(config.pipeline.deadline_seconds),
    ));
    info!("integrity pipeline initialized");

    let blast_radius = Arc::new(BlastRadiusAnalyzer::new(lineage.clone(), events.clone()));

    Ok(AppState { config, pipeline, vault, adapter, events, lineage, blast_radius, started_at: Instant::now() })
}

/// Reads every file directly under `path` as a golden document. A missing
/// or empty directory yields an empty corpus, which `GoldenCorpus::empty()`
/// handles with the documented midpoint default (§4.6).
async fn load_golden_corpus(path: &str) -> Vec<String> {
    let mut texts = Vec::new();
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(_) => return texts,
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.path().extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        if let Ok(content) = tokio::fs::read_to_string(entry.path()).await {
            texts.push(content);
        }
    }
    texts
}

fn create_app(state: AppState, config: &Config) -> Result<Router, Box<dyn std::error::Error>> {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            health::health_check,
            health::readiness_check,
            query::run_query,
            query::run_query_unsafe,
            quarantine::list_quarantine,
            quarantine::confirm_quarantine,
            quarantine::restore_quarantine,
            blast_radius::blast_radius,
            events::recent_events,
            events::stream_events,
            demo::reset,
            status::status,
        ),
        components(schemas(
            query::QueryRequest,
            query::QueryResponse,
            query::IntegritySignalsDto,
            quarantine::QuarantineActionRequest,
            status::StatusResponse,
        )),
        tags(
            (name = "health", description = "Health check endpoints"),
            (name = "query", description = "The protected query pipeline and its gated unsafe bypass"),
            (name = "quarantine", description = "Quarantine vault workflow"),
            (name = "blast_radius", description = "Blast-radius impact analysis"),
            (name = "events", description = "Event bus: recent events and a live stream"),
            (name = "demo", description = "Demonstration reset"),
            (name = "status", description = "Process status summary"),
        )
    )]
    struct ApiDoc;

    let api_routes = Router::new()
        .merge(query::query_routes())
        .merge(quarantine::quarantine_routes())
        .merge(blast_radius::blast_radius_routes())
        .merge(events::events_routes())
        .merge(demo::demo_routes())
        .merge(status::status_routes());

    let router = Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", axum::routing::get(health::health_check))
        .route("/ready", axum::routing::get(health::readiness_check))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(api_middleware::security_headers::security_headers_middleware))
                .layer(axum::middleware::from_fn(api_middleware::request_id::request_id_middleware))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(build_cors_layer(&config.cors)?),
        )
        .with_state(state)
        .fallback(handler_404);

    Ok(router)
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "resource not found" })))
}

fn init_tracing() {
    use tracing_subscriber::Layer;

    let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "integrity_api=debug,integrity_core=debug,tower_http=debug".into());

    // production gets structured JSON lines for log aggregation; anywhere
    // else gets the human-readable pretty formatter.
    let fmt_layer: Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> = if environment == "production" {
        Box::new(tracing_subscriber::fmt::layer().json())
    } else {
        Box::new(tracing_subscriber::fmt::layer())
    };

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

async fn shutdown_signal(grace_seconds: u64) {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate()).expect("failed to install signal handler").recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal, grace period {}s", grace_seconds);
        },
        _ = terminate => {
            info!("received terminate signal, grace period {}s", grace_seconds);
        },
    }
}
