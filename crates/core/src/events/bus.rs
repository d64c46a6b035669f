use super::event::{Event, EventBuilder, EventCode, EventLevel, SubscriberId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, Mutex};

/// Bounded per-subscriber buffer; a lagging subscriber is dropped rather
/// than allowed to slow the publisher (slow-consumer policy, §5).
const SUBSCRIBER_BUFFER: usize = 256;
/// How many recent events are cached in memory for fast `recent()` without
/// reading the file back, bounded so the process doesn't grow unbounded.
const RECENT_CACHE: usize = 2048;

/// Contract for the event bus and logger (C1): append-only persistence plus
/// live fan-out to subscribers.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, builder: EventBuilder) -> Result<u64>;
    fn subscribe(&self) -> (SubscriberId, broadcast::Receiver<Event>);
    fn unsubscribe(&self, id: SubscriberId);
    async fn recent(&self, limit: usize) -> Result<Vec<Event>>;
    /// Truncate the durable log and the recent-events cache. Live
    /// subscribers are left connected; only `POST /api/demo/reset` calls
    /// this (§6).
    async fn clear(&self) -> Result<()>;
}

/// File-backed event bus: one JSON object per line, flushed on every write,
/// fanned out to live subscribers via a bounded broadcast channel.
pub struct FileEventBus {
    path: PathBuf,
    next_id: AtomicU64,
    writer: Mutex<()>,
    sender: broadcast::Sender<Event>,
    subscribers: DashMap<SubscriberId, ()>,
    recent_cache: Mutex<VecDeque<Event>>,
}

impl FileEventBus {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let (sender, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        let mut next_id = 0u64;
        let mut recent = VecDeque::with_capacity(RECENT_CACHE);
        if let Ok(file) = tokio::fs::File::open(&path).await {
            let mut lines = BufReader::new(file).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if let Ok(event) = serde_json::from_str::<Event>(&line) {
                    next_id = next_id.max(event.event_id + 1);
                    if recent.len() == RECENT_CACHE {
                        recent.pop_front();
                    }
                    recent.push_back(event);
                }
            }
        }
        Ok(Self {
            path,
            next_id: AtomicU64::new(next_id),
            writer: Mutex::new(()),
            sender,
            subscribers: DashMap::new(),
            recent_cache: Mutex::new(recent),
        })
    }

    async fn append_line(&self, event: &Event) -> Result<()> {
        let line = serde_json::to_string(event)?;
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
        Ok(())
    }

    fn broadcast(&self, event: Event) {
        // A send error only happens when there are no receivers; that is
        // not a failure of the bus.
        let _ = self.sender.send(event);
    }
}

#[async_trait]
impl EventBus for FileEventBus {
    async fn publish(&self, builder: EventBuilder) -> Result<u64> {
        let event_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = builder.build(event_id);

        match self.append_line(&event).await {
            Ok(()) => {
                {
                    let mut cache = self.recent_cache.lock().await;
                    if cache.len() == RECENT_CACHE {
                        cache.pop_front();
                    }
                    cache.push_back(event.clone());
                }
                self.broadcast(event);
                Ok(event_id)
            }
            Err(err) => {
                tracing::error!(error = %err, "event sink unwritable");
                let degraded = EventBuilder::new(event.code, "event sink unwritable, durability lost for this event")
                    .level(EventLevel::Critical)
                    .build(event_id);
                self.broadcast(degraded);
                Err(Error::io_error(format!("failed to persist event: {}", err)))
            }
        }
    }

    fn subscribe(&self) -> (SubscriberId, broadcast::Receiver<Event>) {
        let id = SubscriberId::new();
        self.subscribers.insert(id, ());
        (id, self.sender.subscribe())
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.remove(&id);
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Event>> {
        let cache = self.recent_cache.lock().await;
        Ok(cache.iter().rev().take(limit).cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.writer.lock().await;
        tokio::fs::write(&self.path, b"").await.map_err(Error::from)?;
        self.recent_cache.lock().await.clear();
        self.next_id.store(0, Ordering::SeqCst);
        Ok(())
    }
}

/// Convenience helpers matching the normative taxonomy (§4.1), so callers
/// don't hand-construct codes.
pub fn info(code: EventCode, message: impl Into<String>) -> EventBuilder {
    EventBuilder::new(code, message).level(EventLevel::Info)
}

pub fn warn(code: EventCode, message: impl Into<String>) -> EventBuilder {
    EventBuilder::new(code, message).level(EventLevel::Warn)
}

pub fn error(code: EventCode, message: impl Into<String>) -> EventBuilder {
    EventBuilder::new(code, message).level(EventLevel::Error)
}

pub fn critical(code: EventCode, message: impl Into<String>) -> EventBuilder {
    EventBuilder::new(code, message).level(EventLevel::Critical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile_path::temp_path;

    mod tempfile_path {
        use std::path::PathBuf;
        pub fn temp_path(name: &str) -> PathBuf {
            let mut p = std::env::temp_dir();
            p.push(format!("integrity-core-test-{}-{}", std::process::id(), name));
            p
        }
    }

    #[tokio::test]
    async fn publish_assigns_monotonic_ids_and_persists() {
        let path = temp_path("events1.jsonl");
        let _ = tokio::fs::remove_file(&path).await;
        let bus = FileEventBus::new(path.clone()).await.unwrap();

        let id1 = bus
            .publish(info(EventCode::QueryReceived, "query received").correlation_id("q-1"))
            .await
            .unwrap();
        let id2 = bus
            .publish(info(EventCode::RetrievalCompleted, "retrieval completed").correlation_id("q-1"))
            .await
            .unwrap();

        assert!(id2 > id1);

        let recent = bus.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        // reverse-chronological
        assert_eq!(recent[0].event_id, id2);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn subscriber_receives_live_events_in_order() {
        let path = temp_path("events2.jsonl");
        let _ = tokio::fs::remove_file(&path).await;
        let bus = FileEventBus::new(path.clone()).await.unwrap();
        let (_id, mut rx) = bus.subscribe();

        bus.publish(info(EventCode::QueryReceived, "one")).await.unwrap();
        bus.publish(info(EventCode::RetrievalCompleted, "two")).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.message, "one");
        assert_eq!(second.message, "two");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[test]
    fn event_code_rejects_unknown() {
        assert!(EventCode::parse("RAG-9999").is_none());
        assert_eq!(EventCode::parse("RAG-1001"), Some(EventCode::QueryReceived));
    }
}
