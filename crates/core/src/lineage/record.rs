use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action taken for a query, recorded once the integrity decision is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageAction {
    /// All retrieved documents passed integrity checks.
    Clean,
    /// Some but not all retrieved documents were quarantined.
    Partial,
    /// The query was short-circuited before generation (e.g. exact-identifier miss).
    Blocked,
}

/// Append-only record of a query that reached retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageRecord {
    pub query_id: String,
    pub query_text: String,
    pub user_id: String,
    pub retrieved_doc_ids: Vec<String>,
    pub quarantined_doc_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub action: LineageAction,
}
