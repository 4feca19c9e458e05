//! Backend module for RAGChat
//!
//! This module contains the abstraction over the question-answering
//! service and its HTTP implementation.

pub mod base;
pub mod http;

pub use base::{Backend, BackendResult, KnowledgeCount, QueryRequest, QueryResponse};
pub use http::HttpBackend;

use crate::config::BackendConfig;
use crate::error::Result;

/// Create the backend described by configuration
///
/// # Errors
///
/// Returns error if the HTTP client cannot be initialized
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn Backend>> {
    Ok(Box::new(HttpBackend::new(config)?))
}
