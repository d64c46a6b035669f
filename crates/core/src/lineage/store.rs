use super::record::LineageRecord;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, RwLock};

/// Contract for the query-lineage store (C2). Lineage records are
/// intentionally separate from events: they are queried by doc_id over a
/// time window, not by code.
#[async_trait]
pub trait LineageStore: Send + Sync {
    async fn append(&self, record: LineageRecord) -> Result<()>;
    async fn scan(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<LineageRecord>>;
    /// Records where `doc_id` appears in `retrieved_doc_ids`, within the window.
    async fn scan_for_doc(&self, doc_id: &str, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<LineageRecord>>;
    /// Truncate the durable log and the in-memory index. Only
    /// `POST /api/demo/reset` calls this (§6).
    async fn clear(&self) -> Result<()>;
}

/// File-backed lineage store: append-only JSONL, with an in-memory index
/// kept warm for the blast-radius analyzer's window scans.
pub struct FileLineageStore {
    path: PathBuf,
    writer: Mutex<()>,
    records: Arc<RwLock<Vec<LineageRecord>>>,
}

impl FileLineageStore {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut records = Vec::new();
        if let Ok(file) = tokio::fs::File::open(&path).await {
            let mut lines = BufReader::new(file).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if let Ok(record) = serde_json::from_str::<LineageRecord>(&line) {
                    records.push(record);
                }
            }
        }
        Ok(Self {
            path,
            writer: Mutex::new(()),
            records: Arc::new(RwLock::new(records)),
        })
    }
}

#[async_trait]
impl LineageStore for FileLineageStore {
    async fn append(&self, record: LineageRecord) -> Result<()> {
        let line = serde_json::to_string(&record)?;
        {
            let _guard = self.writer.lock().await;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(Error::from)?;
            file.write_all(line.as_bytes()).await.map_err(Error::from)?;
            file.write_all(b"\n").await.map_err(Error::from)?;
            file.flush().await.map_err(Error::from)?;
        }
        self.records.write().await.push(record);
        Ok(())
    }

    async fn scan(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<LineageRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.timestamp >= since && r.timestamp <= until)
            .cloned()
            .collect())
    }

    async fn scan_for_doc(&self, doc_id: &str, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<LineageRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.timestamp >= since && r.timestamp <= until && r.retrieved_doc_ids.iter().any(|d| d == doc_id))
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.writer.lock().await;
        tokio::fs::write(&self.path, b"").await.map_err(Error::from)?;
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::record::LineageAction;

    fn temp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("integrity-core-lineage-test-{}-{}", std::process::id(), name));
        p
    }

    #[tokio::test]
    async fn append_then_scan_for_doc() {
        let path = temp_path("lineage1.jsonl");
        let _ = tokio::fs::remove_file(&path).await;
        let store = FileLineageStore::new(path.clone()).await.unwrap();

        let now = Utc::now();
        store
            .append(LineageRecord {
                query_id: "q1".into(),
                query_text: "how to mitigate CVE-2024-0004".into(),
                user_id: "analyst-1".into(),
                retrieved_doc_ids: vec!["CVE-2024-0004-poisoned".into()],
                quarantined_doc_ids: vec!["CVE-2024-0004-poisoned".into()],
                timestamp: now,
                action: LineageAction::Blocked,
            })
            .await
            .unwrap();

        let found = store
            .scan_for_doc("CVE-2024-0004-poisoned", now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let missed = store
            .scan_for_doc("CVE-9999-0000", now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert!(missed.is_empty());

        let _ = tokio::fs::remove_file(&path).await;
    }
}
