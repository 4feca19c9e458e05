//! Error types for RAGChat
//!
//! This module defines the error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Three families exist:
//!
//! - [`RagChatError`]: application-level failures (configuration, IO, parsing)
//! - [`BackendError`]: failures talking to the question-answering service
//! - [`PersistenceError`]: failures writing the session to durable storage
//!
//! Backend and persistence failures are always recovered locally by the
//! conversation controller; only configuration errors stop the process.

use thiserror::Error;

/// Main error type for RAGChat operations
#[derive(Error, Debug)]
pub enum RagChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend service errors
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] PersistenceError),

    /// Interactive input errors (readline)
    #[error("Input error: {0}")]
    Input(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure of a single backend request
///
/// Every variant maps to the `failure` transition of the conversation
/// controller: no assistant message is recorded and a transient
/// notification is shown instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced an HTTP response (connection refused,
    /// DNS failure, transport timeout)
    #[error("Cannot reach the API server: {0}")]
    Unreachable(String),

    /// The server answered with a non-2xx status
    #[error("API request failed with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, kept as diagnostic text
        body: String,
    },

    /// The server answered 2xx but the body could not be decoded
    #[error("Invalid response from API server: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Unreachable(_) => "unreachable",
            BackendError::Status { .. } => "status",
            BackendError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Failure of a session write
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The serialized session is larger than the configured quota
    #[error("Storage quota exceeded: {size} bytes (limit {limit} bytes)")]
    QuotaExceeded {
        /// Size of the serialized record
        size: usize,
        /// Configured quota
        limit: usize,
    },

    /// The store is disabled or rejected the write
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for RAGChat operations
///
/// Uses `anyhow::Error` so callers can attach context while propagating.
pub type Result<T> = anyhow::Result<T>;
