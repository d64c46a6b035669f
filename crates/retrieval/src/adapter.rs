use crate::document::{Document, DocumentMetadata};
use crate::extract::extract;
use crate::preprocess::MetadataFilter;
use async_trait::async_trait;
use dashmap::DashMap;
use integrity_core::error::{Error, Result};
use integrity_vault::DocumentStore;
use std::sync::Arc;

/// Embeds text into a fixed-dimension vector. The concrete model is out of
/// scope (§1); this is the narrow capability boundary the pipeline depends
/// on (§9).
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A candidate returned by an index lookup, before quarantine/filter
/// post-processing.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub doc_id: String,
    pub distance: f32,
}

/// The pluggable vector index (§9): `upsert`, `query`, `update_metadata`.
/// The concrete ANN implementation is out of scope; this crate ships an
/// in-memory brute-force default suitable for small corpora and tests.
#[async_trait]
pub trait Index: Send + Sync {
    async fn upsert(&self, doc: Document, vector: Vec<f32>) -> Result<()>;
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexHit>>;
    async fn update_metadata(&self, doc_id: &str, f: Box<dyn FnOnce(&mut DocumentMetadata) + Send>) -> Result<()>;
    async fn get(&self, doc_id: &str) -> Result<Option<Document>>;
    async fn len(&self) -> Result<usize>;
    /// Drop every indexed document. Only `POST /api/demo/reset` calls this (§6).
    async fn clear(&self) -> Result<()>;
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

/// Brute-force in-memory index: linear scan, cosine distance. Adequate for
/// the corpus sizes this middleware is evaluated against; a production
/// deployment swaps in a real ANN backend behind the same `Index` trait.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: DashMap<String, (Document, Vec<f32>)>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Index for InMemoryIndex {
    async fn upsert(&self, doc: Document, vector: Vec<f32>) -> Result<()> {
        self.entries.insert(doc.doc_id.clone(), (doc, vector));
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        let mut scored: Vec<IndexHit> = self
            .entries
            .iter()
            .map(|entry| {
                let (doc, vec) = entry.value();
                IndexHit { doc_id: doc.doc_id.clone(), distance: cosine_distance(vector, vec) }
            })
            .collect();
        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn update_metadata(&self, doc_id: &str, f: Box<dyn FnOnce(&mut DocumentMetadata) + Send>) -> Result<()> {
        match self.entries.get_mut(doc_id) {
            Some(mut entry) => {
                f(&mut entry.value_mut().0.metadata);
                Ok(())
            }
            None => Err(Error::retrieval_error(format!("document {} not found in index", doc_id))),
        }
    }

    async fn get(&self, doc_id: &str) -> Result<Option<Document>> {
        Ok(self.entries.get(doc_id).map(|e| e.value().0.clone()))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

/// Over-fetch factor applied when `exclude_quarantined` is set (§4.5: "≥3").
pub const OVERFETCH_FACTOR: usize = 3;

/// Thin wrapper over the pluggable vector store with metadata filtering
/// (C5, §4.5). Shared read-mostly; the only writers are ingestion and the
/// vault's metadata flips (serialized per doc_id by the vault).
pub struct RetrievalAdapter {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn Index>,
    overfetch_factor: usize,
}

impl RetrievalAdapter {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn Index>, overfetch_factor: usize) -> Self {
        Self { embedder, index, overfetch_factor: overfetch_factor.max(OVERFETCH_FACTOR) }
    }

    /// `retrieve(text, k, exclude_quarantined, metadata_filter?) -> ordered
    /// list of (doc, distance)` (§4.5).
    pub async fn retrieve(
        &self,
        text: &str,
        k: usize,
        exclude_quarantined: bool,
        metadata_filter: Option<&MetadataFilter>,
    ) -> Result<Vec<(Document, f32)>> {
        let vector = self.embedder.embed(text).await?;
        let overfetch = if exclude_quarantined { k * self.overfetch_factor } else { k };
        let hits = self.index.query(&vector, overfetch.max(k)).await?;

        let mut survivors = Vec::with_capacity(k);
        for hit in hits {
            if survivors.len() >= k {
                break;
            }
            let Some(doc) = self.index.get(&hit.doc_id).await? else {
                continue;
            };
            if exclude_quarantined && doc.metadata.is_quarantined {
                continue;
            }
            if let Some(filter) = metadata_filter {
                if doc.metadata.primary_identifier() != Some(filter.identifier.as_str()) {
                    continue;
                }
            }
            survivors.push((doc, hit.distance));
        }
        Ok(survivors)
    }

    /// `ingest(doc_id, content, metadata)` (§4.5): extracts identifiers from
    /// content and places the first one under the scalar identifier field
    /// used by the exact-match filter, then embeds and upserts.
    pub async fn ingest(&self, doc_id: impl Into<String>, content: impl Into<String>, mut metadata: DocumentMetadata) -> Result<()> {
        let doc_id = doc_id.into();
        let content = content.into();
        let extracted = extract(&content);
        if let Some(first) = extracted.into_iter().next() {
            metadata.identifiers.clear();
            metadata.identifiers.insert(first);
        }
        let vector = self.embedder.embed(&content).await?;
        let doc = Document::new(doc_id, content, metadata);
        self.index.upsert(doc, vector).await
    }

    pub async fn get(&self, doc_id: &str) -> Result<Option<Document>> {
        self.index.get(doc_id).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.index.len().await
    }

    /// Drop every indexed document. Only `POST /api/demo/reset` calls this (§6).
    pub async fn clear(&self) -> Result<()> {
        self.index.clear().await
    }
}

#[async_trait]
impl DocumentStore for RetrievalAdapter {
    async fn set_quarantine_flag(&self, doc_id: &str, quarantined: bool, quarantine_id: Option<&str>) -> Result<()> {
        let quarantine_id = quarantine_id.unwrap_or("").to_string();
        self.index
            .update_metadata(
                doc_id,
                Box::new(move |metadata| {
                    metadata.is_quarantined = quarantined;
                    metadata.quarantine_id = quarantine_id;
                }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentCategory;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            // Deterministic toy embedding: bag-of-chars length buckets, enough
            // to give distinct documents distinct (and stable) vectors.
            let mut v = vec![0.0f32; 8];
            for (i, byte) in text.bytes().enumerate() {
                v[i % 8] += byte as f32;
            }
            Ok(v)
        }
    }

    fn clean_metadata(source: &str) -> DocumentMetadata {
        DocumentMetadata::new(source, DocumentCategory::Clean)
    }

    #[tokio::test]
    async fn ingest_then_retrieve_by_identifier_l1() {
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder);
        let index: Arc<dyn Index> = Arc::new(InMemoryIndex::new());
        let adapter = RetrievalAdapter::new(embedder, index, OVERFETCH_FACTOR);

        adapter
            .ingest("doc-1", "Patch guidance for CVE-2024-0001", clean_metadata("nvd.nist.gov"))
            .await
            .unwrap();
        adapter.ingest("doc-2", "unrelated filler content", clean_metadata("example.com")).await.unwrap();

        let query = crate::preprocess::process("How do I patch CVE-2024-0001?", 3);
        let results = adapter
            .retrieve(&query.augmented_text, 5, true, query.metadata_filter.as_ref())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.doc_id, "doc-1");
    }

    #[tokio::test]
    async fn quarantined_documents_are_excluded() {
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder);
        let index: Arc<dyn Index> = Arc::new(InMemoryIndex::new());
        let adapter = RetrievalAdapter::new(embedder, index, OVERFETCH_FACTOR);

        adapter.ingest("doc-1", "some content about CVE-2024-0002", clean_metadata("nvd.nist.gov")).await.unwrap();
        adapter.set_quarantine_flag("doc-1", true, Some("Q-1")).await.unwrap();

        let results = adapter.retrieve("CVE-2024-0002", 5, true, None).await.unwrap();
        assert!(results.is_empty());
    }
}
