//! # Event Bus & Logger (C1)
//!
//! Append-only structured event log with fan-out to live subscribers.
//! Grounded in the audit-event/audit-backend pattern: `Event`/
//! `EventBuilder` replace an audit event and its builder; `EventBus`
//! replaces a pluggable audit backend trait; `FileEventBus` replaces a
//! database-backed repository with JSONL persistence plus a bounded
//! broadcast fan-out.

pub mod bus;
pub mod event;

pub use bus::{critical, error, info, warn, EventBus, FileEventBus};
pub use event::{Event, EventBuilder, EventCode, EventLevel, SubscriberId};
