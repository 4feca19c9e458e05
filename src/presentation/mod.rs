//! Presentation adapter
//!
//! Projects the session onto a display surface. Presenters receive shared
//! references only; they have no way to change the conversation.

pub mod format;
pub mod terminal;

pub use format::{clamp_input, format_metadata, format_stats, input_counter, UNKNOWN};
pub use terminal::TerminalPresenter;

use crate::conversation::{Message, Session, SessionStats};
use std::time::{Duration, Instant};

/// Display surface driven by the conversation controller
pub trait Presenter {
    /// Redraw the whole conversation (startup and after a clear)
    fn render_session(&mut self, session: &Session);

    /// Draw one newly appended message
    fn render_message(&mut self, message: &Message);

    /// Draw the query counters
    fn render_stats(&mut self, stats: &SessionStats);

    /// Disable (`true`) or re-enable (`false`) the input affordance
    fn set_busy(&mut self, busy: bool);

    /// Show a transient notification
    fn notify(&mut self, notification: Notification);

    /// Show the size of the backend's knowledge base
    fn render_knowledge_count(&mut self, count: u64);
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Something degraded but the session keeps working
    Warning,
    /// A request failed
    Error,
}

/// A message that disappears after a fixed duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Text shown to the user
    pub message: String,
    issued_at: Instant,
    duration: Duration,
}

impl Notification {
    /// Create a notification issued now
    pub fn new(level: NotificationLevel, message: impl Into<String>, duration: Duration) -> Self {
        Self::issued_at(level, message, duration, Instant::now())
    }

    /// Create a notification with an explicit issue time
    pub fn issued_at(
        level: NotificationLevel,
        message: impl Into<String>,
        duration: Duration,
        issued_at: Instant,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            issued_at,
            duration,
        }
    }

    /// Shorthand for an error notification issued now
    pub fn error(message: impl Into<String>, duration: Duration) -> Self {
        Self::new(NotificationLevel::Error, message, duration)
    }

    /// Shorthand for a warning notification issued now
    pub fn warning(message: impl Into<String>, duration: Duration) -> Self {
        Self::new(NotificationLevel::Warning, message, duration)
    }

    /// Fixed display duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Instant after which the notification is gone
    pub fn expires_at(&self) -> Instant {
        self.issued_at + self.duration
    }

    /// Whether the notification has been dismissed by `now`
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::presentation::Notification;
    /// use std::time::{Duration, Instant};
    ///
    /// let n = Notification::error("boom", Duration::from_secs(5));
    /// assert!(!n.is_expired_at(Instant::now()));
    /// assert!(n.is_expired_at(n.expires_at()));
    /// ```
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

/// Notifications currently on screen
#[derive(Debug, Default)]
pub struct NotificationBoard {
    active: Vec<Notification>,
}

impl NotificationBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a notification on the board
    pub fn push(&mut self, notification: Notification) {
        self.active.push(notification);
    }

    /// Drop expired notifications and return the remaining ones
    pub fn active(&mut self, now: Instant) -> &[Notification] {
        self.active.retain(|n| !n.is_expired_at(now));
        &self.active
    }
}
