pub mod config;
pub mod error;
pub mod events;
pub mod lineage;

pub use config::{Config, CorsConfig};
pub use error::{Error, ErrorCode, ErrorContext, ErrorMetrics, RequestContext, Result};
pub use events::{Event, EventBuilder, EventBus, EventCode, EventLevel, FileEventBus, SubscriberId};
pub use lineage::{FileLineageStore, LineageAction, LineageRecord, LineageStore};

// Re-export commonly used types from dependencies
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
