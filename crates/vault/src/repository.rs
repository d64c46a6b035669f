use crate::model::QuarantineRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use integrity_core::error::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persistence contract for the vault (C3). Operations on the same
/// `doc_id` must be serialized by the caller via `lock_for_doc`; operations
/// on distinct doc_ids may proceed in parallel.
#[async_trait]
pub trait VaultRepository: Send + Sync {
    async fn create(&self, record: QuarantineRecord) -> Result<()>;
    async fn update(&self, record: &QuarantineRecord) -> Result<()>;
    async fn get(&self, quarantine_id: &str) -> Result<Option<QuarantineRecord>>;
    async fn list(&self, include_restored: bool) -> Result<Vec<QuarantineRecord>>;
    /// The single active (non-RESTORED) record for a doc_id, if any (P3).
    async fn active_for_doc(&self, doc_id: &str) -> Result<Option<QuarantineRecord>>;
    /// Acquire the per-doc_id lock used to serialize vault operations (§5).
    fn lock_for_doc(&self, doc_id: &str) -> Arc<Mutex<()>>;
    /// Remove a record entirely. Used only to unwind a `create` whose
    /// follow-on metadata flip failed (§4.3).
    async fn delete(&self, quarantine_id: &str) -> Result<()>;
    /// Remove every record and its on-disk directory. Only
    /// `POST /api/demo/reset` calls this (§6).
    async fn clear(&self) -> Result<()>;
}

/// File-backed vault repository. Each record lives under its own directory:
/// `vault/Q-<timestamp>-<doc_id>/{content, metadata, record, audit.jsonl}`.
/// An in-memory index (`DashMap`) mirrors the durable state for fast reads;
/// every mutation is written through to disk before the in-memory index is
/// updated.
pub struct FileVaultRepository {
    root: PathBuf,
    records: DashMap<String, QuarantineRecord>,
    /// doc_id -> quarantine_id of the currently active record
    active_index: DashMap<String, String>,
    doc_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileVaultRepository {
    pub async fn new(root: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&root).await?;
        let repo = Self {
            root,
            records: DashMap::new(),
            active_index: DashMap::new(),
            doc_locks: DashMap::new(),
        };
        repo.load_existing().await?;
        Ok(repo)
    }

    async fn load_existing(&self) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let record_path = entry.path().join("record");
            if !record_path.exists() {
                continue;
            }
            let contents = tokio::fs::read_to_string(&record_path).await?;
            let record: QuarantineRecord = serde_json::from_str(&contents)?;
            if record.state.is_active() {
                self.active_index.insert(record.doc_id.clone(), record.quarantine_id.clone());
            }
            self.records.insert(record.quarantine_id.clone(), record);
        }
        Ok(())
    }

    fn record_dir(&self, record: &QuarantineRecord) -> PathBuf {
        self.root.join(format!("Q-{}-{}", record.quarantined_at.timestamp_millis(), record.doc_id))
    }

    async fn persist(&self, record: &QuarantineRecord) -> Result<()> {
        let dir = self.record_dir(record);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("content"), &record.content_snapshot).await?;
        tokio::fs::write(dir.join("metadata"), serde_json::to_vec_pretty(&record.original_metadata)?).await?;
        tokio::fs::write(dir.join("record"), serde_json::to_vec_pretty(record)?).await?;

        let audit_line = record
            .state_history
            .last()
            .map(serde_json::to_string)
            .transpose()?
            .unwrap_or_default();
        if !audit_line.is_empty() {
            use tokio::io::AsyncWriteExt;
            let mut audit = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("audit.jsonl"))
                .await?;
            audit.write_all(audit_line.as_bytes()).await?;
            audit.write_all(b"\n").await?;
            audit.flush().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl VaultRepository for FileVaultRepository {
    async fn create(&self, record: QuarantineRecord) -> Result<()> {
        if self.active_index.contains_key(&record.doc_id) {
            return Err(Error::vault_error(format!(
                "doc_id {} already has an active quarantine record",
                record.doc_id
            )));
        }
        self.persist(&record).await?;
        self.active_index.insert(record.doc_id.clone(), record.quarantine_id.clone());
        self.records.insert(record.quarantine_id.clone(), record);
        Ok(())
    }

    async fn update(&self, record: &QuarantineRecord) -> Result<()> {
        self.persist(record).await?;
        if record.state.is_active() {
            self.active_index.insert(record.doc_id.clone(), record.quarantine_id.clone());
        } else {
            // Only clear the index if this record was the active one.
            if self.active_index.get(&record.doc_id).map(|v| v.clone()) == Some(record.quarantine_id.clone()) {
                self.active_index.remove(&record.doc_id);
            }
        }
        self.records.insert(record.quarantine_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, quarantine_id: &str) -> Result<Option<QuarantineRecord>> {
        Ok(self.records.get(quarantine_id).map(|r| r.clone()))
    }

    async fn list(&self, include_restored: bool) -> Result<Vec<QuarantineRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| include_restored || entry.state != crate::model::QuarantineState::Restored)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn active_for_doc(&self, doc_id: &str) -> Result<Option<QuarantineRecord>> {
        match self.active_index.get(doc_id) {
            Some(quarantine_id) => self.get(&quarantine_id).await,
            None => Ok(None),
        }
    }

    fn lock_for_doc(&self, doc_id: &str) -> Arc<Mutex<()>> {
        self.doc_locks.entry(doc_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    async fn delete(&self, quarantine_id: &str) -> Result<()> {
        if let Some((_, record)) = self.records.remove(quarantine_id) {
            if self.active_index.get(&record.doc_id).map(|v| v.clone()) == Some(quarantine_id.to_string()) {
                self.active_index.remove(&record.doc_id);
            }
            let dir = self.record_dir(&record);
            let _ = tokio::fs::remove_dir_all(&dir).await;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let ids: Vec<String> = self.records.iter().map(|entry| entry.key().clone()).collect();
        for id in ids {
            if let Some((_, record)) = self.records.remove(&id) {
                let dir = self.record_dir(&record);
                let _ = tokio::fs::remove_dir_all(&dir).await;
            }
        }
        self.active_index.clear();
        Ok(())
    }
}
