//! Conversation controller
//!
//! Drives the submit/response cycle. The controller owns the session and is
//! the only code that mutates it. Every mutation is followed by a persist
//! call; persist failures are logged and never block the conversation.
//!
//! ```text
//!   Idle --begin(text)--> AwaitingResponse --finish(Ok)--> Idle
//!                               |
//!                               +--------finish(Err)--> Idle
//! ```

use super::metrics::QueryMetrics;
use super::session::{Message, Session, SessionStats};
use crate::backend::{Backend, QueryResponse};
use crate::error::BackendError;
use crate::presentation::{Notification, Presenter};
use crate::storage::SessionStore;
use std::time::{Duration, Instant};

/// Default lifetime of a notification
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(5);

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Ready for a new question
    Idle,
    /// A backend call is in flight; new submissions are refused
    AwaitingResponse,
}

/// Result of [`ConversationController::begin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The question was recorded; send it to the backend
    Admitted(String),
    /// Blank input, nothing happened
    Ignored,
    /// A query is already in flight, nothing happened
    Busy,
}

/// Result of one full submit cycle
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// A query is already in flight, nothing happened
    Busy,
    /// The backend answered and the answer was recorded
    Answered {
        /// Rounded response time that was recorded
        response_time_seconds: f64,
    },
    /// The backend call failed; the question stays unpaired
    Failed(BackendError),
}

/// Rounds elapsed wall-clock time to two decimals
///
/// # Examples
///
/// ```
/// use ragchat::conversation::round_seconds;
/// use std::time::Duration;
///
/// assert_eq!(round_seconds(Duration::from_millis(421)), 0.42);
/// assert_eq!(round_seconds(Duration::from_millis(1234)), 1.23);
/// ```
pub fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

/// Owns the session and mediates between backend, store and presenter
pub struct ConversationController<P: Presenter> {
    session: Session,
    state: ControllerState,
    backend: Box<dyn Backend>,
    store: Box<dyn SessionStore>,
    presenter: P,
    notification_duration: Duration,
    in_flight: Option<QueryMetrics>,
}

impl<P: Presenter> ConversationController<P> {
    /// Creates a controller with an empty session
    ///
    /// Call [`startup`](Self::startup) or [`hydrate`](Self::hydrate) to load
    /// the persisted conversation.
    pub fn new(backend: Box<dyn Backend>, store: Box<dyn SessionStore>, presenter: P) -> Self {
        Self {
            session: Session::new(),
            state: ControllerState::Idle,
            backend,
            store,
            presenter,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
            in_flight: None,
        }
    }

    /// Sets how long notifications stay visible
    pub fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }

    /// Current conversation, read-only
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether a query is in flight
    pub fn is_busy(&self) -> bool {
        self.state == ControllerState::AwaitingResponse
    }

    /// Derived counters
    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    /// The presenter
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The presenter, mutably (for rendering outside the cycle)
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Loads the persisted session and renders it, then probes the backend
    pub async fn startup(&mut self) {
        self.hydrate();
        self.check_backend().await;
    }

    /// Replaces the session with the persisted one, if any, and renders it
    pub fn hydrate(&mut self) {
        if self.is_busy() {
            tracing::warn!("Ignoring hydrate while a query is in flight");
            return;
        }
        self.restore();
        self.render();
    }

    /// Replaces the session with the persisted one without rendering
    ///
    /// Returns whether a persisted session was found.
    pub fn restore(&mut self) -> bool {
        if self.is_busy() {
            tracing::warn!("Ignoring restore while a query is in flight");
            return false;
        }

        match self.store.load() {
            Some(session) => {
                tracing::info!(
                    "Restored {} messages ({} queries) from storage",
                    session.len(),
                    session.query_count()
                );
                self.session = session;
                true
            }
            None => false,
        }
    }

    /// Redraws the whole conversation and the counters
    pub fn render(&mut self) {
        self.presenter.render_session(&self.session);
        self.presenter.render_stats(&self.session.stats());
    }

    /// Checks backend health and shows the knowledge count
    ///
    /// Returns whether the health check passed. An unreachable backend only
    /// produces a warning; the user can still try to ask questions.
    pub async fn check_backend(&mut self) -> bool {
        let healthy = match self.backend.health().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                self.presenter.notify(Notification::warning(
                    format!("{}. Make sure the API server is running.", e),
                    self.notification_duration,
                ));
                false
            }
        };

        match self.backend.knowledge_count().await {
            Ok(count) => self.presenter.render_knowledge_count(count),
            Err(e) => tracing::debug!("Knowledge count unavailable: {}", e),
        }

        healthy
    }

    /// Admits a question
    ///
    /// On admission the user message is appended and persisted before the
    /// backend is contacted, and the controller enters `AwaitingResponse`.
    pub fn begin(&mut self, text: &str) -> Admission {
        if self.is_busy() {
            tracing::debug!("Submission refused: query in flight");
            return Admission::Busy;
        }

        let question = text.trim();
        if question.is_empty() {
            return Admission::Ignored;
        }

        self.session.append(Message::user(question));
        self.persist();
        if let Some(message) = self.session.messages().last() {
            self.presenter.render_message(message);
        }

        self.state = ControllerState::AwaitingResponse;
        self.in_flight = Some(QueryMetrics::start());
        self.presenter.set_busy(true);

        Admission::Admitted(question.to_string())
    }

    /// Completes the in-flight query with the backend's result
    pub fn finish(
        &mut self,
        result: Result<QueryResponse, BackendError>,
        elapsed: Duration,
    ) -> SubmitOutcome {
        if !self.is_busy() {
            tracing::warn!("finish called without a query in flight");
            return SubmitOutcome::Ignored;
        }

        let metrics = self.in_flight.take();
        let outcome = match result {
            Ok(response) => {
                let seconds = round_seconds(elapsed);
                let (answer, meta) = response.into_answer(seconds);
                self.session.append(Message::assistant(answer, meta));
                self.session.record_query(seconds);
                self.persist();

                if let Some(message) = self.session.messages().last() {
                    self.presenter.render_message(message);
                }
                self.presenter.render_stats(&self.session.stats());

                if let Some(metrics) = metrics {
                    metrics.record_success(elapsed);
                }
                SubmitOutcome::Answered {
                    response_time_seconds: seconds,
                }
            }
            Err(error) => {
                if let BackendError::Status { status, body } = &error {
                    tracing::error!("Query failed with status {}: {}", status, body);
                } else {
                    tracing::error!("Query failed: {}", error);
                }

                self.presenter.notify(Notification::error(
                    error.to_string(),
                    self.notification_duration,
                ));

                if let Some(metrics) = metrics {
                    metrics.record_failure(&error, elapsed);
                }
                SubmitOutcome::Failed(error)
            }
        };

        self.state = ControllerState::Idle;
        self.presenter.set_busy(false);
        outcome
    }

    /// Runs one full cycle: admit, query the backend, record the result
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ragchat::backend::HttpBackend;
    /// use ragchat::config::BackendConfig;
    /// use ragchat::conversation::{ConversationController, SubmitOutcome};
    /// use ragchat::presentation::TerminalPresenter;
    /// use ragchat::storage::MemorySessionStore;
    ///
    /// # tokio_test::block_on(async {
    /// let backend = HttpBackend::new(&BackendConfig::default()).unwrap();
    /// let mut controller = ConversationController::new(
    ///     Box::new(backend),
    ///     Box::new(MemorySessionStore::default()),
    ///     TerminalPresenter::stdout(vec![]),
    /// );
    ///
    /// if let SubmitOutcome::Answered { response_time_seconds } =
    ///     controller.submit("What is IPv4?").await
    /// {
    ///     println!("answered in {:.2}s", response_time_seconds);
    /// }
    /// # });
    /// ```
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let question = match self.begin(text) {
            Admission::Admitted(question) => question,
            Admission::Ignored => return SubmitOutcome::Ignored,
            Admission::Busy => return SubmitOutcome::Busy,
        };

        tracing::debug!("Sending query ({} chars)", question.chars().count());
        let started = Instant::now();
        let result = self.backend.query(&question).await;
        let elapsed = started.elapsed();

        self.finish(result, elapsed)
    }

    /// Erases the conversation and its persisted copy
    ///
    /// Refused (returns `false`) while a query is in flight so a late answer
    /// cannot land in a fresh session.
    pub fn clear(&mut self) -> bool {
        if self.is_busy() {
            tracing::debug!("Clear refused: query in flight");
            return false;
        }

        self.session.clear();
        self.store.clear();
        self.render();
        tracing::info!("Conversation cleared");
        true
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.session) {
            tracing::warn!("Failed to save chat history: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DisabledSessionStore, MemorySessionStore};
    use crate::test_utils::{PresenterEvent, RecordingPresenter, ScriptedBackend};
    use crate::conversation::{Dimensions, Role};
    use serde_json::json;

    fn response(answer: &str) -> QueryResponse {
        serde_json::from_value(json!({
            "answer": answer,
            "dimensions": {"K": 3, "C": 1, "R": 0},
            "matched_docs": [{"id": 1}, {"id": 2}],
            "scenario": "networking"
        }))
        .expect("valid response")
    }

    fn controller(
        backend: ScriptedBackend,
        store: Box<dyn SessionStore>,
    ) -> ConversationController<RecordingPresenter> {
        ConversationController::new(Box::new(backend), store, RecordingPresenter::default())
    }

    #[test]
    fn test_round_seconds() {
        assert_eq!(round_seconds(Duration::from_millis(0)), 0.0);
        assert_eq!(round_seconds(Duration::from_millis(420)), 0.42);
        assert_eq!(round_seconds(Duration::from_millis(1234)), 1.23);
    }

    #[tokio::test]
    async fn test_successful_query_records_answer() {
        let backend = ScriptedBackend::new().with_response(Ok(response("IPv4 is ...")));
        let mut c = controller(backend, Box::new(MemorySessionStore::default()));

        let outcome = c.submit("What is IPv4?").await;

        assert!(matches!(outcome, SubmitOutcome::Answered { .. }));
        assert_eq!(c.state(), ControllerState::Idle);

        let messages = c.session().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is IPv4?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "IPv4 is ...");

        let meta = messages[1].meta.as_ref().expect("assistant metadata");
        assert_eq!(meta.matched_document_count, 2);
        assert_eq!(meta.scenario.as_deref(), Some("networking"));
        assert_eq!(
            meta.dimensions,
            Some(Dimensions {
                k: Some(3.0),
                c: Some(1.0),
                r: Some(0.0),
            })
        );

        assert_eq!(c.session().query_count(), 1);
        assert!(c.stats().average_response_time.is_some());
    }

    #[tokio::test]
    async fn test_question_is_trimmed_before_sending() {
        let backend = ScriptedBackend::new().with_response(Ok(response("ok")));
        let queries = backend.queries();
        let mut c = controller(backend, Box::new(MemorySessionStore::default()));

        c.submit("  What is DNS?\n").await;

        assert_eq!(queries.lock().expect("lock").as_slice(), ["What is DNS?"]);
        assert_eq!(c.session().messages()[0].content, "What is DNS?");
    }

    #[tokio::test]
    async fn test_backend_error_leaves_question_unpaired() {
        let backend = ScriptedBackend::new().with_response(Err(BackendError::Status {
            status: 500,
            body: "internal".to_string(),
        }));
        let mut c = controller(backend, Box::new(MemorySessionStore::default()));

        let outcome = c.submit("What is IPv4?").await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Failed(BackendError::Status { status: 500, .. })
        ));
        assert_eq!(c.session().len(), 1);
        assert_eq!(c.session().messages()[0].role, Role::User);
        assert_eq!(c.session().query_count(), 0);
        assert_eq!(c.state(), ControllerState::Idle);

        let notes = c.presenter().notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "API request failed with status 500");
        assert_eq!(notes[0].duration(), DEFAULT_NOTIFICATION_DURATION);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = ScriptedBackend::new();
        let queries = backend.queries();
        let mut c = controller(backend, Box::new(MemorySessionStore::default()));

        assert_eq!(c.submit("   \n\t").await, SubmitOutcome::Ignored);
        assert_eq!(c.submit("").await, SubmitOutcome::Ignored);

        assert!(c.session().is_empty());
        assert!(queries.lock().expect("lock").is_empty());
        assert!(c.presenter().events().is_empty());
    }

    #[test]
    fn test_second_submission_refused_while_awaiting() {
        let mut c = controller(
            ScriptedBackend::new(),
            Box::new(MemorySessionStore::default()),
        );

        assert_eq!(c.begin("first"), Admission::Admitted("first".to_string()));
        assert_eq!(c.state(), ControllerState::AwaitingResponse);
        assert_eq!(c.begin("second"), Admission::Busy);

        assert_eq!(c.session().len(), 1);
        assert_eq!(c.session().messages()[0].content, "first");
    }

    #[test]
    fn test_clear_refused_while_awaiting() {
        let mut c = controller(
            ScriptedBackend::new(),
            Box::new(MemorySessionStore::default()),
        );

        c.begin("question");
        assert!(!c.clear());
        assert_eq!(c.session().len(), 1);

        c.finish(Ok(response("answer")), Duration::from_millis(100));
        assert!(c.clear());
        assert!(c.session().is_empty());
    }

    #[test]
    fn test_busy_affordance_toggles_around_query() {
        let mut c = controller(
            ScriptedBackend::new(),
            Box::new(MemorySessionStore::default()),
        );

        c.begin("question");
        assert_eq!(c.presenter().busy_states(), vec![true]);
        c.finish(Ok(response("answer")), Duration::from_millis(100));
        assert_eq!(c.presenter().busy_states(), vec![true, false]);
    }

    #[test]
    fn test_finish_without_begin_is_ignored() {
        let mut c = controller(
            ScriptedBackend::new(),
            Box::new(MemorySessionStore::default()),
        );

        let outcome = c.finish(Ok(response("late")), Duration::from_millis(10));

        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(c.session().is_empty());
    }

    #[test]
    fn test_average_uses_rounded_response_times() {
        let mut c = controller(
            ScriptedBackend::new(),
            Box::new(MemorySessionStore::default()),
        );

        c.begin("q1");
        c.finish(Ok(response("a1")), Duration::from_millis(300));
        c.begin("q2");
        c.finish(Ok(response("a2")), Duration::from_millis(500));

        let stats = c.stats();
        assert_eq!(stats.query_count, 2);
        let avg = stats.average_response_time.expect("average defined");
        assert!((avg - 0.40).abs() < 1e-9);
        assert_eq!(stats.last_response_time, Some(0.5));
    }

    #[tokio::test]
    async fn test_persist_failure_does_not_block_conversation() {
        let backend = ScriptedBackend::new().with_response(Ok(response("still works")));
        let mut c = controller(backend, Box::new(DisabledSessionStore::new("test")));

        let outcome = c.submit("question").await;

        assert!(matches!(outcome, SubmitOutcome::Answered { .. }));
        assert_eq!(c.session().len(), 2);
        assert_eq!(c.session().query_count(), 1);
    }

    #[tokio::test]
    async fn test_hydrate_restores_persisted_session() {
        let store = MemorySessionStore::default();
        let mut saved = Session::new();
        saved.append(Message::user("earlier question"));
        store.save(&saved).expect("save");

        let mut c = controller(ScriptedBackend::new(), Box::new(store));
        c.hydrate();

        assert_eq!(c.session(), &saved);
        assert!(matches!(
            c.presenter().events().first(),
            Some(PresenterEvent::Session(1))
        ));
    }

    #[test]
    fn test_clear_erases_store() {
        let mut c = controller(
            ScriptedBackend::new(),
            Box::new(MemorySessionStore::default()),
        );
        c.begin("q");
        c.finish(Ok(response("a")), Duration::from_millis(100));

        assert!(c.clear());
        c.hydrate();

        assert!(c.session().is_empty());
        assert_eq!(c.session().query_count(), 0);
    }

    #[tokio::test]
    async fn test_startup_warns_when_backend_unhealthy() {
        let backend = ScriptedBackend::new().unhealthy();
        let mut c = controller(backend, Box::new(MemorySessionStore::default()));

        c.startup().await;

        let notes = c.presenter().notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("Cannot reach the API server"));
    }

    #[tokio::test]
    async fn test_startup_renders_knowledge_count() {
        let backend = ScriptedBackend::new().with_knowledge_count(128);
        let mut c = controller(backend, Box::new(MemorySessionStore::default()));

        c.startup().await;

        assert!(c
            .presenter()
            .events()
            .contains(&PresenterEvent::KnowledgeCount(128)));
        assert!(c.presenter().notifications().is_empty());
    }
}
