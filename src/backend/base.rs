//! Backend trait and wire types for the question-answering service
//!
//! The service exposes three endpoints that this client consumes:
//!
//! - `GET /api/health`
//! - `POST /api/query` with `{"query": "..."}`
//! - `GET /api/knowledge/count`

use crate::conversation::{Dimensions, Metadata};
use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a single backend call
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Request body for `POST /api/query`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QueryRequest {
    /// The user's question, already trimmed
    pub query: String,
}

/// Successful body of `POST /api/query`
///
/// Only `answer` is expected; every other field may be missing. The
/// service's own field names (`final_answer`, `scenario_used`) are accepted
/// as aliases.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct QueryResponse {
    /// Generated answer text
    #[serde(default, alias = "final_answer")]
    pub answer: String,
    /// K/C/R scoring dimensions
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    /// Documents that matched the question (only the count is used)
    #[serde(default)]
    pub matched_docs: Option<Vec<serde_json::Value>>,
    /// Scenario the question was classified into
    #[serde(default, alias = "scenario_used")]
    pub scenario: Option<String>,
}

impl QueryResponse {
    /// Splits the response into answer text and display metadata
    ///
    /// # Arguments
    ///
    /// * `response_time_seconds` - Measured round trip, already rounded
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::backend::QueryResponse;
    ///
    /// let response: QueryResponse =
    ///     serde_json::from_str(r#"{"answer": "IPv4 is...", "matched_docs": [1, 2]}"#).unwrap();
    /// let (answer, meta) = response.into_answer(0.42);
    /// assert_eq!(answer, "IPv4 is...");
    /// assert_eq!(meta.matched_document_count, 2);
    /// assert!(meta.scenario.is_none());
    /// ```
    pub fn into_answer(self, response_time_seconds: f64) -> (String, Metadata) {
        let meta = Metadata {
            response_time_seconds,
            matched_document_count: self.matched_docs.as_ref().map_or(0, Vec::len),
            scenario: self.scenario.filter(|s| !s.trim().is_empty()),
            dimensions: self.dimensions,
        };
        (self.answer, meta)
    }
}

/// Body of `GET /api/knowledge/count`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct KnowledgeCount {
    /// Number of knowledge points the service indexes
    pub count: u64,
}

/// The question-answering service as seen by the conversation controller
///
/// Implementations own their transport, including timeouts; a timeout is
/// reported as an ordinary [`BackendError`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Probe the service; `Ok` means reachable
    async fn health(&self) -> BackendResult<()>;

    /// Ask a question
    async fn query(&self, question: &str) -> BackendResult<QueryResponse>;

    /// Number of indexed knowledge points
    async fn knowledge_count(&self) -> BackendResult<u64>;
}
