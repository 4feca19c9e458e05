//! HTTP implementation of the backend collaborator
//!
//! Talks to the question-answering service with `reqwest`. Every failure
//! is classified into a [`BackendError`] so the conversation controller can
//! recover from it.

use crate::backend::{Backend, BackendResult, KnowledgeCount, QueryRequest, QueryResponse};
use crate::config::BackendConfig;
use crate::error::{BackendError, RagChatError, Result};

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// HTTP client for the question-answering service
///
/// # Examples
///
/// ```
/// use ragchat::backend::HttpBackend;
/// use ragchat::config::BackendConfig;
///
/// let backend = HttpBackend::new(&BackendConfig::default()).unwrap();
/// assert_eq!(backend.base_url(), "http://localhost:8000");
/// ```
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend
    ///
    /// The request timeout from `config` is enforced by the HTTP client and
    /// surfaces as [`BackendError::Unreachable`].
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("ragchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RagChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!("Initialized HTTP backend: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into a status error, keeping the body
    async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("API returned error {}: {}", status, body);
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn unreachable(e: reqwest::Error) -> BackendError {
    tracing::warn!("API request failed: {}", e);
    BackendError::Unreachable(e.to_string())
}

fn invalid(e: reqwest::Error) -> BackendError {
    tracing::error!("Failed to parse API response: {}", e);
    BackendError::InvalidResponse(e.to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> BackendResult<()> {
        let url = self.endpoint("/api/health");
        tracing::debug!("Checking API health: {}", url);

        let response = self.client.get(&url).send().await.map_err(unreachable)?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn query(&self, question: &str) -> BackendResult<QueryResponse> {
        let url = self.endpoint("/api/query");
        let request = QueryRequest {
            query: question.to_string(),
        };
        tracing::debug!("Sending query to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(unreachable)?;
        let response = Self::check_status(response).await?;

        response.json::<QueryResponse>().await.map_err(invalid)
    }

    async fn knowledge_count(&self) -> BackendResult<u64> {
        let url = self.endpoint("/api/knowledge/count");

        let response = self.client.get(&url).send().await.map_err(unreachable)?;
        let response = Self::check_status(response).await?;
        let body: KnowledgeCount = response.json().await.map_err(invalid)?;
        Ok(body.count)
    }
}
