use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Severity levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
    Critical,
}

impl std::fmt::Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The fixed, normative event-code taxonomy. Unknown codes are rejected by
/// `EventCode::parse` — the bus never accepts an unrecognized code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCode {
    #[serde(rename = "RAG-1001")]
    QueryReceived,
    #[serde(rename = "RAG-1002")]
    RetrievalFallbackOrQuarantineOnly,
    #[serde(rename = "RAG-1003")]
    IntegrityCheckPassed,
    #[serde(rename = "RAG-2001")]
    DocumentQuarantined,
    #[serde(rename = "RAG-2002")]
    QuarantineConfirmed,
    #[serde(rename = "RAG-2003")]
    QuarantineRestored,
    #[serde(rename = "RAG-3001")]
    BlastRadiusRequested,
    #[serde(rename = "RAG-3002")]
    BlastRadiusHighOrCritical,
    #[serde(rename = "RAG-4001")]
    RetrievalCompleted,
    #[serde(rename = "RAG-4002")]
    GenerationCompleted,
}

impl EventCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCode::QueryReceived => "RAG-1001",
            EventCode::RetrievalFallbackOrQuarantineOnly => "RAG-1002",
            EventCode::IntegrityCheckPassed => "RAG-1003",
            EventCode::DocumentQuarantined => "RAG-2001",
            EventCode::QuarantineConfirmed => "RAG-2002",
            EventCode::QuarantineRestored => "RAG-2003",
            EventCode::BlastRadiusRequested => "RAG-3001",
            EventCode::BlastRadiusHighOrCritical => "RAG-3002",
            EventCode::RetrievalCompleted => "RAG-4001",
            EventCode::GenerationCompleted => "RAG-4002",
        }
    }

    /// Parse a normative code string, rejecting anything outside the fixed
    /// taxonomy.
    pub fn parse(code: &str) -> Option<Self> {
        Some(match code {
            "RAG-1001" => EventCode::QueryReceived,
            "RAG-1002" => EventCode::RetrievalFallbackOrQuarantineOnly,
            "RAG-1003" => EventCode::IntegrityCheckPassed,
            "RAG-2001" => EventCode::DocumentQuarantined,
            "RAG-2002" => EventCode::QuarantineConfirmed,
            "RAG-2003" => EventCode::QuarantineRestored,
            "RAG-3001" => EventCode::BlastRadiusRequested,
            "RAG-3002" => EventCode::BlastRadiusHighOrCritical,
            "RAG-4001" => EventCode::RetrievalCompleted,
            "RAG-4002" => EventCode::GenerationCompleted,
            _ => return None,
        })
    }

    pub fn category(&self) -> &'static str {
        match self {
            EventCode::QueryReceived
            | EventCode::RetrievalFallbackOrQuarantineOnly
            | EventCode::IntegrityCheckPassed => "query",
            EventCode::DocumentQuarantined | EventCode::QuarantineConfirmed | EventCode::QuarantineRestored => {
                "vault"
            }
            EventCode::BlastRadiusRequested | EventCode::BlastRadiusHighOrCritical => "blast_radius",
            EventCode::RetrievalCompleted | EventCode::GenerationCompleted => "pipeline",
        }
    }
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single structured event, append-only once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonically unique identifier for this event.
    pub event_id: u64,
    pub code: EventCode,
    pub level: EventLevel,
    pub category: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// `query_id` when this event correlates to a query.
    pub correlation_id: Option<String>,
    pub payload: HashMap<String, serde_json::Value>,
}

/// Builder for `Event`, mirroring the audit-event builder pattern.
pub struct EventBuilder {
    code: EventCode,
    level: EventLevel,
    message: String,
    correlation_id: Option<String>,
    payload: HashMap<String, serde_json::Value>,
}

impl EventBuilder {
    pub fn new(code: EventCode, message: impl Into<String>) -> Self {
        Self {
            code,
            level: EventLevel::Info,
            message: message.into(),
            correlation_id: None,
            payload: HashMap::new(),
        }
    }

    pub fn level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn payload(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Assign the monotonic event id. Called by the bus at publish time so
    /// builders never guess at ordering themselves.
    pub(crate) fn build(self, event_id: u64) -> Event {
        Event {
            event_id,
            category: self.code.category().to_string(),
            code: self.code,
            level: self.level,
            message: self.message,
            timestamp: Utc::now(),
            correlation_id: self.correlation_id,
            payload: self.payload,
        }
    }
}

/// A live subscription to the event bus's fan-out, identified so it can be
/// torn down individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}
