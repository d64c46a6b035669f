use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four real-valued integrity signals for a single document, plus the
/// derived quarantine decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IntegritySignals {
    pub trust: f64,
    pub red_flag: f64,
    pub anomaly: f64,
    pub semantic_drift: f64,
    pub should_quarantine: bool,
}

impl IntegritySignals {
    /// Clip every field into [0,1]. Does not recompute `should_quarantine`;
    /// callers apply the aggregator rule separately.
    pub fn clipped(trust: f64, red_flag: f64, anomaly: f64, semantic_drift: f64, should_quarantine: bool) -> Self {
        Self {
            trust: trust.clamp(0.0, 1.0),
            red_flag: red_flag.clamp(0.0, 1.0),
            anomaly: anomaly.clamp(0.0, 1.0),
            semantic_drift: semantic_drift.clamp(0.0, 1.0),
            should_quarantine,
        }
    }

    pub fn as_vec(&self) -> [f64; 4] {
        [self.trust, self.red_flag, self.anomaly, self.semantic_drift]
    }
}

/// State machine for a single quarantine record.
///
/// ```text
///            quarantine()
///        ──────────────▶ QUARANTINED
///                              │  confirm()
///                              ├──────────▶ CONFIRMED_MALICIOUS  (terminal)
///                              │  restore()
///                              └──────────▶ RESTORED             (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuarantineState {
    Quarantined,
    ConfirmedMalicious,
    Restored,
}

impl QuarantineState {
    /// RESTORED and CONFIRMED_MALICIOUS are terminal; only QUARANTINED is active.
    pub fn is_active(&self) -> bool {
        matches!(self, QuarantineState::Quarantined)
    }
}

/// One entry in a record's append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub action: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Durable per-document quarantine record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub quarantine_id: String,
    pub doc_id: String,
    pub content_snapshot: String,
    pub original_metadata: HashMap<String, serde_json::Value>,
    pub signals: IntegritySignals,
    pub reason: String,
    pub quarantined_at: DateTime<Utc>,
    pub state: QuarantineState,
    pub state_history: Vec<StateHistoryEntry>,
}

impl QuarantineRecord {
    pub fn new(
        quarantine_id: String,
        doc_id: String,
        content_snapshot: String,
        original_metadata: HashMap<String, serde_json::Value>,
        signals: IntegritySignals,
        reason: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            quarantine_id,
            doc_id,
            content_snapshot,
            original_metadata,
            signals,
            reason,
            quarantined_at: now,
            state: QuarantineState::Quarantined,
            state_history: vec![StateHistoryEntry {
                action: "quarantine".to_string(),
                actor: "system".to_string(),
                timestamp: now,
                notes: None,
            }],
        }
    }
}
