use crate::document_store::DocumentStore;
use crate::model::{IntegritySignals, QuarantineRecord, QuarantineState, StateHistoryEntry};
use crate::repository::VaultRepository;
use chrono::Utc;
use integrity_core::error::{Error, Result};
use integrity_core::events::{self, EventBus, EventCode};
use std::collections::HashMap;
use std::sync::Arc;

/// Quarantine Vault (C3): enforces the state machine and the vault
/// invariants (P3 uniqueness, P4 flag/record agreement, P8 idempotent
/// confirm/restore) on top of a `VaultRepository` and a `DocumentStore`
/// handle into the retrieval adapter.
pub struct VaultService {
    repository: Arc<dyn VaultRepository>,
    documents: Arc<dyn DocumentStore>,
    events: Arc<dyn EventBus>,
}

impl VaultService {
    pub fn new(repository: Arc<dyn VaultRepository>, documents: Arc<dyn DocumentStore>, events: Arc<dyn EventBus>) -> Self {
        Self { repository, documents, events }
    }

    /// `quarantine(doc_id, content_snapshot, metadata, signals, reason) -> quarantine_id`.
    pub async fn quarantine(
        &self,
        doc_id: &str,
        content_snapshot: String,
        metadata: HashMap<String, serde_json::Value>,
        signals: IntegritySignals,
        reason: String,
        correlation_id: Option<String>,
    ) -> Result<String> {
        let lock = self.repository.lock_for_doc(doc_id);
        let _guard = lock.lock().await;

        if self.repository.active_for_doc(doc_id).await?.is_some() {
            return Err(Error::vault_error(format!("doc_id {} already has an active quarantine record", doc_id)));
        }

        let quarantine_id = format!("Q-{}-{}", Utc::now().timestamp_millis(), doc_id);
        let record = QuarantineRecord::new(quarantine_id.clone(), doc_id.to_string(), content_snapshot, metadata, signals, reason);

        self.repository.create(record).await?;

        match self.documents.set_quarantine_flag(doc_id, true, Some(&quarantine_id)).await {
            Ok(()) => {
                let mut builder = events::info(EventCode::DocumentQuarantined, format!("document {} quarantined", doc_id));
                if let Some(cid) = &correlation_id {
                    builder = builder.correlation_id(cid.clone());
                }
                let _ = self.events.publish(builder).await;
                Ok(quarantine_id)
            }
            Err(err) => {
                self.repository.delete(&quarantine_id).await?;
                let mut builder = events::error(
                    EventCode::DocumentQuarantined,
                    format!("failed to flip is_quarantined for {}: {}", doc_id, err),
                );
                if let Some(cid) = &correlation_id {
                    builder = builder.correlation_id(cid.clone());
                }
                let _ = self.events.publish(builder).await;
                Err(Error::vault_error(format!("failed to flip quarantine flag for {}: {}", doc_id, err)))
            }
        }
    }

    /// `confirm(quarantine_id, actor, notes)`. Valid only from QUARANTINED.
    pub async fn confirm(&self, quarantine_id: &str, actor: &str, notes: Option<String>) -> Result<()> {
        // Peek the record only to learn which doc_id's lock to take; the
        // authoritative read happens after acquiring the lock below, so two
        // concurrent confirms on the same record can't both pass the state
        // check against a stale copy (P8, §5 per-doc serialization).
        let doc_id = self
            .repository
            .get(quarantine_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("quarantine record {} not found", quarantine_id)))?
            .doc_id;

        let _guard = self.repository.lock_for_doc(&doc_id).lock().await;

        let mut record = self
            .repository
            .get(quarantine_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("quarantine record {} not found", quarantine_id)))?;

        if record.state != QuarantineState::Quarantined {
            return Err(Error::invalid_state(format!(
                "cannot confirm record {} in state {:?}",
                quarantine_id, record.state
            )));
        }

        record.state = QuarantineState::ConfirmedMalicious;
        record.state_history.push(StateHistoryEntry {
            action: "confirm".to_string(),
            actor: actor.to_string(),
            timestamp: Utc::now(),
            notes,
        });
        self.repository.update(&record).await?;

        let _ = self
            .events
            .publish(events::info(EventCode::QuarantineConfirmed, format!("quarantine {} confirmed by {}", quarantine_id, actor)))
            .await;
        Ok(())
    }

    /// `restore(quarantine_id, actor, notes)`. Valid only from QUARANTINED.
    pub async fn restore(&self, quarantine_id: &str, actor: &str, notes: Option<String>) -> Result<()> {
        // Same peek-then-lock-then-reread pattern as `confirm` above.
        let doc_id = self
            .repository
            .get(quarantine_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("quarantine record {} not found", quarantine_id)))?
            .doc_id;

        let _guard = self.repository.lock_for_doc(&doc_id).lock().await;

        let mut record = self
            .repository
            .get(quarantine_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("quarantine record {} not found", quarantine_id)))?;

        if record.state != QuarantineState::Quarantined {
            return Err(Error::invalid_state(format!(
                "cannot restore record {} in state {:?}",
                quarantine_id, record.state
            )));
        }

        self.documents.set_quarantine_flag(&record.doc_id, false, None).await?;

        record.state = QuarantineState::Restored;
        record.state_history.push(StateHistoryEntry {
            action: "restore".to_string(),
            actor: actor.to_string(),
            timestamp: Utc::now(),
            notes,
        });
        self.repository.update(&record).await?;

        let _ = self
            .events
            .publish(events::info(EventCode::QuarantineRestored, format!("quarantine {} restored by {}", quarantine_id, actor)))
            .await;
        Ok(())
    }

    pub async fn list(&self, include_restored: bool) -> Result<Vec<QuarantineRecord>> {
        self.repository.list(include_restored).await
    }

    pub async fn get(&self, quarantine_id: &str) -> Result<Option<QuarantineRecord>> {
        self.repository.get(quarantine_id).await
    }

    pub async fn active_for_doc(&self, doc_id: &str) -> Result<Option<QuarantineRecord>> {
        self.repository.active_for_doc(doc_id).await
    }

    /// Discard every quarantine record. Only `POST /api/demo/reset` calls
    /// this (§6); it does not touch `adapter.metadata[D].is_quarantined` —
    /// callers clearing the whole demo state also clear the index.
    pub async fn clear(&self) -> Result<()> {
        self.repository.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::FileVaultRepository;
    use async_trait::async_trait;
    use integrity_core::events::FileEventBus;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockDocumentStore {
        fail: AtomicBool,
        flags: dashmap::DashMap<String, bool>,
    }

    impl MockDocumentStore {
        fn new(fail: bool) -> Self {
            Self { fail: AtomicBool::new(fail), flags: dashmap::DashMap::new() }
        }
    }

    #[async_trait]
    impl DocumentStore for MockDocumentStore {
        async fn set_quarantine_flag(&self, doc_id: &str, quarantined: bool, _quarantine_id: Option<&str>) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::retrieval_error("forced failure"));
            }
            self.flags.insert(doc_id.to_string(), quarantined);
            Ok(())
        }
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("integrity-vault-test-{}-{}", std::process::id(), name));
        p
    }

    fn sample_signals(quarantine: bool) -> IntegritySignals {
        IntegritySignals::clipped(0.0, 0.2, 0.5, 0.5, quarantine)
    }

    #[tokio::test]
    async fn quarantine_then_duplicate_is_rejected() {
        let root = temp_dir("q1");
        let _ = tokio::fs::remove_dir_all(&root).await;
        let repo: Arc<dyn VaultRepository> = Arc::new(FileVaultRepository::new(root.clone()).await.unwrap());
        let docs: Arc<dyn DocumentStore> = Arc::new(MockDocumentStore::new(false));
        let events: Arc<dyn EventBus> = Arc::new(FileEventBus::new(root.join("events.jsonl")).await.unwrap());
        let service = VaultService::new(repo, docs, events);

        let id = service
            .quarantine("doc-1", "content".into(), HashMap::new(), sample_signals(true), "test".into(), None)
            .await
            .unwrap();
        assert!(id.starts_with("Q-"));

        let err = service
            .quarantine("doc-1", "content".into(), HashMap::new(), sample_signals(true), "test".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, integrity_core::ErrorCode::VaultError);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn failed_flag_flip_removes_record() {
        let root = temp_dir("q2");
        let _ = tokio::fs::remove_dir_all(&root).await;
        let repo: Arc<dyn VaultRepository> = Arc::new(FileVaultRepository::new(root.clone()).await.unwrap());
        let docs: Arc<dyn DocumentStore> = Arc::new(MockDocumentStore::new(true));
        let events: Arc<dyn EventBus> = Arc::new(FileEventBus::new(root.join("events.jsonl")).await.unwrap());
        let service = VaultService::new(repo.clone(), docs, events);

        let err = service
            .quarantine("doc-2", "content".into(), HashMap::new(), sample_signals(true), "test".into(), None)
            .await;
        assert!(err.is_err());
        assert!(repo.active_for_doc("doc-2").await.unwrap().is_none());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn confirm_twice_fails_with_invalid_state() {
        let root = temp_dir("q3");
        let _ = tokio::fs::remove_dir_all(&root).await;
        let repo: Arc<dyn VaultRepository> = Arc::new(FileVaultRepository::new(root.clone()).await.unwrap());
        let docs: Arc<dyn DocumentStore> = Arc::new(MockDocumentStore::new(false));
        let events: Arc<dyn EventBus> = Arc::new(FileEventBus::new(root.join("events.jsonl")).await.unwrap());
        let service = VaultService::new(repo, docs, events);

        let id = service
            .quarantine("doc-3", "content".into(), HashMap::new(), sample_signals(true), "test".into(), None)
            .await
            .unwrap();

        service.confirm(&id, "analyst-1", None).await.unwrap();
        let err = service.confirm(&id, "analyst-1", None).await.unwrap_err();
        assert_eq!(err.code, integrity_core::ErrorCode::InvalidState);

        let record = service.get(&id).await.unwrap().unwrap();
        // two entries: the initial "quarantine" entry plus one "confirm" entry, not two
        assert_eq!(record.state_history.len(), 2);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn restore_flips_flag_and_allows_requarantine() {
        let root = temp_dir("q4");
        let _ = tokio::fs::remove_dir_all(&root).await;
        let repo: Arc<dyn VaultRepository> = Arc::new(FileVaultRepository::new(root.clone()).await.unwrap());
        let docs: Arc<dyn DocumentStore> = Arc::new(MockDocumentStore::new(false));
        let events: Arc<dyn EventBus> = Arc::new(FileEventBus::new(root.join("events.jsonl")).await.unwrap());
        let service = VaultService::new(repo, docs, events);

        let id = service
            .quarantine("doc-4", "content".into(), HashMap::new(), sample_signals(true), "test".into(), None)
            .await
            .unwrap();
        service.restore(&id, "analyst-1", None).await.unwrap();

        assert!(service.active_for_doc("doc-4").await.unwrap().is_none());

        // P3/P7: a doc can be re-quarantined under a new id after restore
        let id2 = service
            .quarantine("doc-4", "content".into(), HashMap::new(), sample_signals(true), "test".into(), None)
            .await
            .unwrap();
        assert_ne!(id, id2);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
