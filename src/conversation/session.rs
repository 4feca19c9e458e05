//! Session state: the ordered message list and its running counters
//!
//! The session is the single owner of conversation truth. It is mutated
//! only by the conversation controller; everything else reads it through
//! a shared reference.

use serde::{Deserialize, Deserializer, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing questions
    User,
    /// The question-answering service
    Assistant,
}

/// Scoring dimensions reported by the backend
///
/// Each letter is optional; a missing letter renders as `unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Knowledge dimension
    #[serde(
        rename = "K",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub k: Option<f64>,
    /// Cognition dimension
    #[serde(
        rename = "C",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub c: Option<f64>,
    /// Reasoning dimension
    #[serde(
        rename = "R",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub r: Option<f64>,
}

/// Read a finite number from a JSON number or a numeric string
///
/// `"NaN"` and `"inf"` parse as floats but count as absent, since JSON
/// cannot store them.
pub(crate) fn finite_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Accept a JSON number or a numeric string; anything else is absent.
///
/// Backends in the wild report dimension levels both as `3` and `"3"`.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(finite_number))
}

/// Display-only data attached to an assistant answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Wall-clock time of the request, rounded to two decimals
    pub response_time_seconds: f64,
    /// Number of documents the backend matched
    pub matched_document_count: usize,
    /// Scenario the backend classified the question into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// K/C/R scoring dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

/// A single chat message
///
/// Messages are immutable once created and identified by their position
/// in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// Answer metadata (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
}

impl Message {
    /// Creates a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::conversation::{Message, Role};
    ///
    /// let msg = Message::user("What is IPv4?");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.meta.is_none());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            meta: None,
        }
    }

    /// Creates an assistant message carrying answer metadata
    pub fn assistant(content: impl Into<String>, meta: Metadata) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            meta: Some(meta),
        }
    }
}

/// Derived counters shown next to the conversation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    /// Completed queries
    pub query_count: u64,
    /// Mean response time, undefined before the first completed query
    pub average_response_time: Option<f64>,
    /// Response time of the most recent answer
    pub last_response_time: Option<f64>,
}

/// The full conversation state for one user
///
/// Invariant: `query_count` equals the number of assistant messages that
/// came from completed queries, and the average response time is always
/// derived from the two counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    messages: Vec<Message>,
    query_count: u64,
    total_response_time_seconds: f64,
}

impl Session {
    /// Creates an empty session
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::conversation::Session;
    ///
    /// let session = Session::new();
    /// assert!(session.is_empty());
    /// assert_eq!(session.average_response_time(), None);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a session from persisted parts
    ///
    /// Negative or non-finite totals are reset to zero so the counters stay
    /// non-negative.
    pub fn from_parts(
        messages: Vec<Message>,
        query_count: u64,
        total_response_time_seconds: f64,
    ) -> Self {
        let total = if total_response_time_seconds.is_finite() && total_response_time_seconds >= 0.0
        {
            total_response_time_seconds
        } else {
            tracing::warn!(
                "Discarding invalid total response time: {}",
                total_response_time_seconds
            );
            0.0
        };

        Self {
            messages,
            query_count,
            total_response_time_seconds: total,
        }
    }

    /// Appends a message at the end of the conversation
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Counts one completed query and its response time
    ///
    /// Must be called once per successful query and never on failure.
    pub fn record_query(&mut self, response_time_seconds: f64) {
        let seconds = if response_time_seconds.is_finite() && response_time_seconds >= 0.0 {
            response_time_seconds
        } else {
            tracing::warn!("Ignoring invalid response time: {}", response_time_seconds);
            0.0
        };

        self.query_count += 1;
        self.total_response_time_seconds += seconds;
    }

    /// Resets messages and counters in one step
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Mean response time, `None` until a query has completed
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::conversation::Session;
    ///
    /// let mut session = Session::new();
    /// session.record_query(0.5);
    /// session.record_query(1.5);
    /// assert_eq!(session.average_response_time(), Some(1.0));
    /// ```
    pub fn average_response_time(&self) -> Option<f64> {
        if self.query_count == 0 {
            None
        } else {
            Some(self.total_response_time_seconds / self.query_count as f64)
        }
    }

    /// Messages in conversation order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Completed query count
    pub fn query_count(&self) -> u64 {
        self.query_count
    }

    /// Sum of all recorded response times
    pub fn total_response_time_seconds(&self) -> f64 {
        self.total_response_time_seconds
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Response time attached to the latest assistant answer
    pub fn last_response_time(&self) -> Option<f64> {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.meta.as_ref().map(|meta| meta.response_time_seconds))
    }

    /// Snapshot of the derived counters
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            query_count: self.query_count,
            average_response_time: self.average_response_time(),
            last_response_time: self.last_response_time(),
        }
    }
}
