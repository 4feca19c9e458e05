//! Terminal rendering with colored output

use super::format::{display_content, format_metadata, format_stats};
use super::{Notification, NotificationBoard, NotificationLevel, Presenter};
use crate::conversation::{Message, Role, Session, SessionStats};
use colored::Colorize;
use std::io::{self, Write};
use std::time::Instant;

/// Presenter that writes lines to a terminal (or any writer)
pub struct TerminalPresenter<W: Write = io::Stdout> {
    out: W,
    example_prompts: Vec<String>,
    board: NotificationBoard,
    busy: bool,
}

impl TerminalPresenter<io::Stdout> {
    /// Presenter writing to standard output
    pub fn stdout(example_prompts: Vec<String>) -> Self {
        Self::new(io::stdout(), example_prompts)
    }
}

impl<W: Write> TerminalPresenter<W> {
    /// Presenter writing to `out`
    pub fn new(out: W, example_prompts: Vec<String>) -> Self {
        Self {
            out,
            example_prompts,
            board: NotificationBoard::new(),
            busy: false,
        }
    }

    /// Whether a query is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Messages of notifications still visible at `now`
    pub fn active_notifications(&mut self, now: Instant) -> Vec<String> {
        self.board
            .active(now)
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    /// Print the numbered example prompts
    pub fn render_examples(&mut self) {
        let lines: Vec<String> = self
            .example_prompts
            .iter()
            .enumerate()
            .map(|(i, prompt)| format!("  {}. {}", i + 1, prompt))
            .collect();
        self.line("Try one of these:".bold());
        for line in lines {
            self.line(line);
        }
    }

    /// Consume the presenter and return the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl std::fmt::Display) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::debug!("Failed to write to terminal: {}", e);
        }
    }

    fn welcome(&mut self) {
        self.line("");
        self.line("Ask a question about the knowledge base.".bold());
        self.render_examples();
        self.line("");
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render_session(&mut self, session: &Session) {
        if session.is_empty() {
            self.welcome();
            return;
        }

        for message in session.messages() {
            self.render_message(message);
        }
    }

    fn render_message(&mut self, message: &Message) {
        match message.role {
            Role::User => {
                let line = format!("{} {}", "You:".cyan().bold(), display_content(&message.content));
                self.line(line);
            }
            Role::Assistant => {
                self.line("Assistant:".green().bold());
                let content = display_content(&message.content).to_string();
                self.line(content);
                if let Some(meta) = &message.meta {
                    self.line(format_metadata(meta).dimmed());
                }
                self.line("");
            }
        }
    }

    fn render_stats(&mut self, stats: &SessionStats) {
        self.line(format_stats(stats).dimmed());
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        if busy {
            self.line("Thinking...".dimmed());
        }
    }

    fn notify(&mut self, notification: Notification) {
        let text = match notification.level {
            NotificationLevel::Error => format!("✗ {}", notification.message).red(),
            NotificationLevel::Warning => format!("! {}", notification.message).yellow(),
        };
        self.line(text);
        self.board.push(notification);
    }

    fn render_knowledge_count(&mut self, count: u64) {
        self.line(format!("Knowledge points: {}", count).dimmed());
    }
}
