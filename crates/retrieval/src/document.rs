use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Document category, as carried in `DocumentMetadata::category`. `Unknown`
/// is the default for documents ingested without an explicit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Clean,
    Poisoned,
    Golden,
    Unknown,
}

impl Default for DocumentCategory {
    fn default() -> Self {
        DocumentCategory::Unknown
    }
}

/// Metadata attached to a document. The core owns `is_quarantined` and
/// `quarantine_id`; everything else belongs to the ingesting caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub category: DocumentCategory,
    pub title: Option<String>,
    /// Extracted identifiers (§4.4). Stored as a set but persisted scalar —
    /// the adapter keeps only the first element when an index requires a
    /// scalar metadata value (spec.md §4.5).
    pub identifiers: BTreeSet<String>,
    pub is_quarantined: bool,
    /// Empty string when not quarantined.
    pub quarantine_id: String,
}

impl DocumentMetadata {
    pub fn new(source: impl Into<String>, category: DocumentCategory) -> Self {
        Self {
            source: source.into(),
            category,
            title: None,
            identifiers: BTreeSet::new(),
            is_quarantined: false,
            quarantine_id: String::new(),
        }
    }

    /// The scalar identifier used by the exact-match filter, if any (§4.4,
    /// §4.5: "lists are stored as the first element").
    pub fn primary_identifier(&self) -> Option<&str> {
        self.identifiers.iter().next().map(|s| s.as_str())
    }
}

/// A document as seen by the core (§3). Identifier is a stable string; the
/// retrieval adapter owns the document, not the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(doc_id: impl Into<String>, content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self { doc_id: doc_id.into(), content: content.into(), metadata }
    }
}
