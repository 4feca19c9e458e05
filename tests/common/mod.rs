use ragchat::conversation::{Message, Session, SessionStats};
use ragchat::presentation::{Notification, Presenter};
use ragchat::storage::SledSessionStore;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_store() -> (SledSessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SledSessionStore::new_with_path(tmp.path().join("session.db"), 5 * 1024 * 1024)
        .expect("failed to open sled store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Presenter that only remembers what the tests look at
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct CapturingPresenter {
    pub rendered_messages: Vec<Message>,
    pub notifications: Vec<Notification>,
    pub last_stats: Option<SessionStats>,
    pub busy: bool,
    pub knowledge_count: Option<u64>,
}

impl Presenter for CapturingPresenter {
    fn render_session(&mut self, session: &Session) {
        self.rendered_messages = session.messages().to_vec();
    }

    fn render_message(&mut self, message: &Message) {
        self.rendered_messages.push(message.clone());
    }

    fn render_stats(&mut self, stats: &SessionStats) {
        self.last_stats = Some(*stats);
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn render_knowledge_count(&mut self, count: u64) {
        self.knowledge_count = Some(count);
    }
}
