use super::{ErrorCode, ErrorContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Low priority errors that don't affect system functionality
    Low,
    /// Medium priority errors that may degrade performance
    Medium,
    /// High priority errors that affect core functionality
    High,
    /// Critical errors that require immediate attention
    Critical,
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Validation,
    Retrieval,
    Scoring,
    Vault,
    Generation,
    Timeout,
    Io,
    System,
}

/// Main error type for the integrity gate
#[derive(Debug, ThisError, Clone)]
pub struct Error {
    /// Standardized error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional detailed description
    pub details: Option<String>,
    /// Error context for debugging
    pub context: ErrorContext,
    /// Error severity
    pub severity: ErrorSeverity,
    /// Optional cause chain
    pub cause: Option<Box<Error>>,
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            context: ErrorContext::new(),
            severity: Self::default_severity_for_code(code),
            cause: None,
        }
    }

    /// Create error with details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Set error context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Set error severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Chain with another error as cause
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Add trace to context
    pub fn add_trace(mut self, trace: impl Into<String>) -> Self {
        self.context = self.context.add_trace(trace.into());
        self
    }

    /// Add metadata to context
    pub fn add_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.add_metadata(key.into(), value);
        self
    }

    /// Get HTTP status code
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self.code.category() {
            "validation" => ErrorCategory::Validation,
            "retrieval" => ErrorCategory::Retrieval,
            "scoring" => ErrorCategory::Scoring,
            "vault" => ErrorCategory::Vault,
            "generation" => ErrorCategory::Generation,
            "timeout" => ErrorCategory::Timeout,
            "io" => ErrorCategory::Io,
            _ => ErrorCategory::System,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Check if should be logged as error level
    pub fn should_log_as_error(&self) -> bool {
        self.code.should_log_as_error() || matches!(self.severity, ErrorSeverity::High | ErrorSeverity::Critical)
    }

    /// Convert to JSON for API responses (sanitized for security)
    pub fn to_api_response(&self) -> serde_json::Value {
        self.to_api_response_with_environment("development")
    }

    /// Convert to JSON for API responses with environment-specific sanitization
    pub fn to_api_response_with_environment(&self, environment: &str) -> serde_json::Value {
        let is_production = environment == "production";

        let (message, details) = if is_production {
            self.sanitize_for_production()
        } else {
            (self.message.clone(), self.details.clone())
        };

        serde_json::json!({
            "error": {
                "code": self.code,
                "message": message,
                "details": if is_production { None } else { details },
                "error_id": self.context.error_id,
                "request_id": self.context.request_id,
                "timestamp": self.context.timestamp
            }
        })
    }

    /// Convert to full debug JSON (for internal logging only, never for API responses)
    pub fn to_debug_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "details": self.details,
                "context": self.context,
                "severity": self.severity,
                "cause": self.cause.as_ref().map(|c| c.to_debug_json())
            }
        })
    }

    /// Sanitize error messages and details for production API responses
    fn sanitize_for_production(&self) -> (String, Option<String>) {
        let sanitized_message = match self.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyQuery
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField => "Input validation failed".to_string(),

            ErrorCode::QuarantineNotFound => "Resource not found".to_string(),
            ErrorCode::InvalidState | ErrorCode::DuplicateActiveRecord => {
                "Requested state transition is not valid".to_string()
            }

            ErrorCode::Timeout | ErrorCode::DeadlineExceeded | ErrorCode::GenerationTimeout | ErrorCode::ScorerTimeout => {
                "The request timed out".to_string()
            }

            ErrorCode::RetrievalError | ErrorCode::IndexUnavailable | ErrorCode::ServiceUnavailable => {
                "The retrieval backend is temporarily unavailable".to_string()
            }

            _ => "An internal error occurred. Please try again later".to_string(),
        };

        (sanitized_message, None)
    }

    /// Get default severity for error code
    fn default_severity_for_code(code: ErrorCode) -> ErrorSeverity {
        match code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyQuery
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::QuarantineNotFound => ErrorSeverity::Low,

            ErrorCode::ScorerError
            | ErrorCode::ScorerTimeout
            | ErrorCode::InvalidState
            | ErrorCode::DuplicateActiveRecord
            | ErrorCode::GenerationTimeout
            | ErrorCode::Timeout
            | ErrorCode::DeadlineExceeded => ErrorSeverity::Medium,

            ErrorCode::RetrievalError | ErrorCode::IndexUnavailable | ErrorCode::LlmError | ErrorCode::ServiceUnavailable => {
                ErrorSeverity::High
            }

            ErrorCode::VaultError
            | ErrorCode::IoError
            | ErrorCode::SerializationError
            | ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::EmbeddingError => ErrorSeverity::Critical,

            ErrorCode::NotImplemented => ErrorSeverity::Medium,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct ErrorSer {
            code: ErrorCode,
            message: String,
            details: Option<String>,
            context: ErrorContext,
            severity: ErrorSeverity,
        }

        let error_ser = ErrorSer {
            code: self.code,
            message: self.message.clone(),
            details: self.details.clone(),
            context: self.context.clone(),
            severity: self.severity,
        };

        error_ser.serialize(serializer)
    }
}

// Convenience constructors, one per error kind named in the error-handling design
impl Error {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn empty_query() -> Self {
        Self::new(ErrorCode::EmptyQuery, "query must not be empty")
    }

    pub fn retrieval_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RetrievalError, message)
    }

    pub fn scorer_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScorerError, message)
    }

    pub fn vault_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::VaultError, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::QuarantineNotFound, message)
    }

    pub fn llm_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LlmError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IoError, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::IoError, err.to_string()).add_trace("std::io::Error conversion")
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, err.to_string()).add_trace("serde_json::Error conversion")
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::new(ErrorCode::ConfigurationError, err.to_string()).add_trace("config::ConfigError conversion")
    }
}
