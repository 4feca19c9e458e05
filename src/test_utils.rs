//! Test utilities for RAGChat
//!
//! Scripted backend, recording presenter and small assertion helpers shared
//! by the unit tests.

use crate::backend::{Backend, BackendResult, QueryResponse};
use crate::config::Config;
use crate::conversation::{Message, Session, SessionStats};
use crate::error::BackendError;
use crate::presentation::{Notification, Presenter};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Assert that an error contains the expected message
pub fn assert_error_contains<T, E: std::fmt::Display>(result: Result<T, E>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

/// Backend that replays queued query results
///
/// Health and knowledge count are fixed at construction. Queries beyond the
/// queued results fail with `Unreachable`.
#[derive(Debug)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<BackendResult<QueryResponse>>>,
    queries: Arc<Mutex<Vec<String>>>,
    healthy: bool,
    knowledge_count: Option<u64>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            queries: Arc::new(Mutex::new(Vec::new())),
            healthy: true,
            knowledge_count: None,
        }
    }

    /// Queue the result of the next query
    pub fn with_response(self, response: BackendResult<QueryResponse>) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
        self
    }

    /// Make the health check fail
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn with_knowledge_count(mut self, count: u64) -> Self {
        self.knowledge_count = Some(count);
        self
    }

    /// Handle to the questions received, in order
    pub fn queries(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.queries)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn health(&self) -> BackendResult<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(BackendError::Unreachable("connection refused".to_string()))
        }
    }

    async fn query(&self, question: &str) -> BackendResult<QueryResponse> {
        self.queries
            .lock()
            .expect("queries lock")
            .push(question.to_string());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Unreachable("no scripted response".to_string())))
    }

    async fn knowledge_count(&self) -> BackendResult<u64> {
        self.knowledge_count
            .ok_or_else(|| BackendError::InvalidResponse("no count".to_string()))
    }
}

/// One call received by [`RecordingPresenter`]
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    /// Full redraw with this many messages
    Session(usize),
    Message(Message),
    Stats(SessionStats),
    Busy(bool),
    Notify(Notification),
    KnowledgeCount(u64),
}

/// Presenter that records every call
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Vec<PresenterEvent>,
}

impl RecordingPresenter {
    pub fn events(&self) -> &[PresenterEvent] {
        &self.events
    }

    pub fn notifications(&self) -> Vec<&Notification> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn busy_states(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Busy(b) => Some(*b),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render_session(&mut self, session: &Session) {
        self.events.push(PresenterEvent::Session(session.len()));
    }

    fn render_message(&mut self, message: &Message) {
        self.events.push(PresenterEvent::Message(message.clone()));
    }

    fn render_stats(&mut self, stats: &SessionStats) {
        self.events.push(PresenterEvent::Stats(*stats));
    }

    fn set_busy(&mut self, busy: bool) {
        self.events.push(PresenterEvent::Busy(busy));
    }

    fn notify(&mut self, notification: Notification) {
        self.events.push(PresenterEvent::Notify(notification));
    }

    fn render_knowledge_count(&mut self, count: u64) {
        self.events.push(PresenterEvent::KnowledgeCount(count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagChatError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<(), RagChatError> =
            Err(RagChatError::Config("test error message".to_string()));
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<(), RagChatError> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_scripted_backend_replays_in_order() {
        let backend = ScriptedBackend::new()
            .with_response(Ok(QueryResponse {
                answer: "first".to_string(),
                ..Default::default()
            }))
            .with_response(Err(BackendError::Status {
                status: 503,
                body: String::new(),
            }));

        assert_eq!(backend.query("a").await.expect("first").answer, "first");
        assert!(backend.query("b").await.is_err());
        assert!(matches!(
            backend.query("c").await,
            Err(BackendError::Unreachable(_))
        ));
        assert_eq!(
            backend.queries().lock().expect("lock").as_slice(),
            ["a", "b", "c"]
        );
    }
}
