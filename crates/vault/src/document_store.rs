use async_trait::async_trait;
use integrity_core::error::Result;

/// The narrow capability the vault needs from the retrieval adapter: the
/// ability to flip a document's `is_quarantined`/`quarantine_id` metadata.
/// The retrieval adapter implements this; the vault never depends on the
/// adapter's concrete type, keeping the reference one-way (vault → adapter
/// handle, never adapter → vault).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn set_quarantine_flag(&self, doc_id: &str, quarantined: bool, quarantine_id: Option<&str>) -> Result<()>;
}
