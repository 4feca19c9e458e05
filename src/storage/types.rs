use crate::conversation::session::finite_number;
use crate::conversation::{Dimensions, Message, Metadata, Role, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the versioned session record
pub const SESSION_KEY: &str = "session";

/// Current layout version of [`SessionRecord`]
pub const RECORD_VERSION: u32 = 1;

/// Legacy key holding the JSON message list
pub const LEGACY_HISTORY_KEY: &str = "chatHistory";

/// Legacy key holding the query counter as text
pub const LEGACY_QUERY_COUNT_KEY: &str = "queryCount";

/// Legacy keys that may hold the cumulative response time as text
pub const LEGACY_TOTAL_TIME_KEYS: [&str; 2] = ["totalResponseTime", "totalResponseTimeSeconds"];

/// The persisted form of a session: one record, written in one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Layout version
    pub version: u32,
    /// When the record was written
    pub saved_at: DateTime<Utc>,
    /// Conversation messages in order
    pub messages: Vec<Message>,
    /// Completed query count
    pub query_count: u64,
    /// Sum of response times
    pub total_response_time_seconds: f64,
}

impl SessionRecord {
    /// Snapshot a session for writing
    pub fn from_session(session: &Session) -> Self {
        Self {
            version: RECORD_VERSION,
            saved_at: Utc::now(),
            messages: session.messages().to_vec(),
            query_count: session.query_count(),
            total_response_time_seconds: session.total_response_time_seconds(),
        }
    }

    /// Rebuild the in-memory session
    pub fn into_session(self) -> Session {
        Session::from_parts(
            self.messages,
            self.query_count,
            self.total_response_time_seconds,
        )
    }
}

/// Message as written by the original browser client under `chatHistory`
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMessage {
    /// `"user"` or `"assistant"`, stored under `type`
    #[serde(rename = "type")]
    pub role: Role,
    /// Message text; older entries may lack it
    #[serde(default)]
    pub content: Option<String>,
    /// Answer metadata, `null` on user messages
    #[serde(default)]
    pub meta: Option<LegacyMeta>,
}

/// Answer metadata in the legacy layout
///
/// `response_time` was stored as a two-decimal string such as `"0.42"`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMeta {
    /// K/C/R scoring dimensions
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    /// Matched documents; only the length is kept
    #[serde(default)]
    pub matched_docs: Option<Vec<serde_json::Value>>,
    /// Response time in seconds, as a number or a string
    #[serde(default)]
    pub response_time: Option<serde_json::Value>,
    /// Scenario label, empty when unclassified
    #[serde(default)]
    pub scenario: Option<String>,
}

impl From<LegacyMessage> for Message {
    fn from(legacy: LegacyMessage) -> Self {
        let meta = legacy.meta.map(|m| Metadata {
            response_time_seconds: m
                .response_time
                .as_ref()
                .and_then(finite_number)
                .filter(|t| *t >= 0.0)
                .unwrap_or(0.0),
            matched_document_count: m.matched_docs.map_or(0, |docs| docs.len()),
            scenario: m.scenario.filter(|s| !s.is_empty()),
            dimensions: m.dimensions,
        });

        Self {
            role: legacy.role,
            content: legacy.content.unwrap_or_default(),
            meta,
        }
    }
}
