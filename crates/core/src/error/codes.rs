use serde::{Deserialize, Serialize};
use std::fmt;

/// Standardized error codes for the integrity gate.
/// Numeric ranges mirror the error kinds of the integrity pipeline's
/// error-handling design: validation, retrieval, scoring, vault,
/// generation, timeout, and I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1000-1999) -- C9 input parsing
    ValidationFailed = 1000,
    EmptyQuery = 1001,
    InvalidInput = 1002,
    MissingRequiredField = 1003,

    // Retrieval errors (2000-2999) -- C5
    RetrievalError = 2000,
    IndexUnavailable = 2001,
    EmbeddingError = 2002,

    // Scoring errors (3000-3999) -- C6
    ScorerError = 3000,
    ScorerTimeout = 3001,

    // Vault errors (4000-4999) -- C3
    VaultError = 4000,
    InvalidState = 4001,
    QuarantineNotFound = 4002,
    DuplicateActiveRecord = 4003,

    // Generation / LLM errors (5000-5999)
    LlmError = 5000,
    GenerationTimeout = 5001,

    // Timeout errors (6000-6999) -- any suspending op
    Timeout = 6000,
    DeadlineExceeded = 6001,

    // I/O errors (7000-7999) -- event/lineage sinks
    IoError = 7000,
    SerializationError = 7001,

    // Internal / configuration errors (8000-8999)
    InternalServerError = 8000,
    ConfigurationError = 8001,
    ServiceUnavailable = 8002,
    NotImplemented = 8003,
}

impl ErrorCode {
    /// Get HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyQuery
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField => 400,

            ErrorCode::RetrievalError | ErrorCode::IndexUnavailable | ErrorCode::ServiceUnavailable => 503,

            ErrorCode::EmbeddingError => 500,

            ErrorCode::ScorerError | ErrorCode::ScorerTimeout => 500,

            ErrorCode::VaultError => 500,
            ErrorCode::InvalidState => 409,
            ErrorCode::QuarantineNotFound => 404,
            ErrorCode::DuplicateActiveRecord => 409,

            ErrorCode::LlmError => 502,
            ErrorCode::GenerationTimeout => 504,

            ErrorCode::Timeout | ErrorCode::DeadlineExceeded => 504,

            ErrorCode::IoError | ErrorCode::SerializationError => 500,

            ErrorCode::InternalServerError | ErrorCode::ConfigurationError => 500,
            ErrorCode::NotImplemented => 501,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyQuery
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField => "validation",

            ErrorCode::RetrievalError | ErrorCode::IndexUnavailable | ErrorCode::EmbeddingError => "retrieval",

            ErrorCode::ScorerError | ErrorCode::ScorerTimeout => "scoring",

            ErrorCode::VaultError
            | ErrorCode::InvalidState
            | ErrorCode::QuarantineNotFound
            | ErrorCode::DuplicateActiveRecord => "vault",

            ErrorCode::LlmError | ErrorCode::GenerationTimeout => "generation",

            ErrorCode::Timeout | ErrorCode::DeadlineExceeded => "timeout",

            ErrorCode::IoError | ErrorCode::SerializationError => "io",

            ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::ServiceUnavailable
            | ErrorCode::NotImplemented => "system",
        }
    }

    /// Check if error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::IndexUnavailable
                | ErrorCode::ServiceUnavailable
                | ErrorCode::ScorerTimeout
                | ErrorCode::GenerationTimeout
        )
    }

    /// Check if error should be logged at error level
    pub fn should_log_as_error(&self) -> bool {
        !matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::EmptyQuery
                | ErrorCode::InvalidInput
                | ErrorCode::MissingRequiredField
                | ErrorCode::QuarantineNotFound
                | ErrorCode::InvalidState
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
