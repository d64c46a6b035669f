//! # Error Handling Framework
//!
//! Structured error management for the integrity gate, matching the error
//! kinds of the integrity pipeline's error-handling design one-for-one:
//! `VALIDATION`, `RETRIEVAL_ERROR`, `SCORER_ERROR`, `VAULT_ERROR`,
//! `LLM_ERROR`, `TIMEOUT`, `IO_ERROR`.
//!
//! ## Core features
//!
//! - **Structured error types**: an `ErrorCode` taxonomy with numeric ranges
//!   per category, an HTTP status mapping, and retry/log-level hints.
//! - **Rich context**: `RequestContext`/`ErrorContext` carry a request id
//!   and a correlation id (the pipeline's `query_id` once assigned).
//! - **Severity classification**: low/medium/high/critical, used to decide
//!   log level and whether an event is surfaced via the event bus.
//! - **Metrics integration**: `ErrorMetrics` tracks per-category and
//!   per-severity counts plus a sliding error rate, for `/api/status`.
//!
//! ```rust
//! use integrity_core::error::{Error, ErrorCode, Result};
//!
//! fn validate_query(query: &str) -> Result<()> {
//!     if query.trim().is_empty() {
//!         return Err(Error::empty_query());
//!     }
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod context;
pub mod framework;
pub mod metrics;

pub use codes::ErrorCode;
pub use context::{ErrorContext, RequestContext};
pub use framework::{Error, ErrorCategory, ErrorSeverity, Result};
pub use metrics::ErrorMetrics;
