use integrity_core::{Config, EventBus, LineageStore};
use integrity_pipeline::{BlastRadiusAnalyzer, IntegrityPipeline};
use integrity_retrieval::RetrievalAdapter;
use integrity_vault::VaultService;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state, cloned into every handler (Arc-backed, cheap
/// to clone). Mirrors the shape of the teacher's `AppState`: one struct
/// holding the process's long-lived services.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<IntegrityPipeline>,
    pub vault: Arc<VaultService>,
    pub adapter: Arc<RetrievalAdapter>,
    pub events: Arc<dyn EventBus>,
    pub lineage: Arc<dyn LineageStore>,
    pub blast_radius: Arc<BlastRadiusAnalyzer>,
    pub started_at: Instant,
}
