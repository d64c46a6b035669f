pub mod document_store;
pub mod model;
pub mod repository;
pub mod service;

pub use document_store::DocumentStore;
pub use model::{IntegritySignals, QuarantineRecord, QuarantineState, StateHistoryEntry};
pub use repository::{FileVaultRepository, VaultRepository};
pub use service::VaultService;
