use crate::config::StorageConfig;
use crate::conversation::{Message, Session};
use crate::error::{PersistenceError, RagChatError, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod types;
pub use types::{LegacyMessage, SessionRecord, RECORD_VERSION, SESSION_KEY};

use types::{LEGACY_HISTORY_KEY, LEGACY_QUERY_COUNT_KEY, LEGACY_TOTAL_TIME_KEYS};

/// Durable home of the chat session
///
/// Writes return their failure to the caller, who logs it and keeps
/// working in memory. Reads never fail: missing or unreadable data is an
/// empty start.
pub trait SessionStore: Send {
    /// Persist the whole session
    fn save(&self, session: &Session) -> std::result::Result<(), PersistenceError>;

    /// Read the saved session, `None` if absent or unreadable
    ///
    /// Unreadable data is left where it is.
    fn load(&self) -> Option<Session>;

    /// Remove the saved session; safe to call when nothing is stored
    fn clear(&self);

    /// When the saved session was last written, if known
    fn saved_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Serialize a session, enforcing the byte quota
fn encode_record(session: &Session, limit: usize) -> std::result::Result<Vec<u8>, PersistenceError> {
    let bytes = serde_json::to_vec(&SessionRecord::from_session(session))
        .map_err(|e| PersistenceError::Unavailable(format!("Serialization failed: {}", e)))?;

    if bytes.len() > limit {
        return Err(PersistenceError::QuotaExceeded {
            size: bytes.len(),
            limit,
        });
    }

    Ok(bytes)
}

fn decode_record(bytes: &[u8]) -> Option<SessionRecord> {
    match serde_json::from_slice::<SessionRecord>(bytes) {
        Ok(record) if record.version == RECORD_VERSION => Some(record),
        Ok(record) => {
            tracing::warn!(
                "Stored session has unsupported version {}; starting empty",
                record.version
            );
            None
        }
        Err(e) => {
            tracing::warn!("Stored session is unreadable ({}); starting empty", e);
            None
        }
    }
}

/// Default location of the session database
///
/// # Errors
///
/// Returns error if the user data directory cannot be determined
pub fn default_store_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "ragchat", "ragchat").ok_or_else(|| {
        RagChatError::Storage(PersistenceError::Unavailable(
            "Could not determine data directory".into(),
        ))
    })?;
    Ok(proj_dirs.data_dir().join("session.db"))
}

/// Session store backed by an embedded `sled` database
pub struct SledSessionStore {
    db: sled::Db,
    path: PathBuf,
    max_bytes: usize,
}

impl SledSessionStore {
    /// Open the store described by configuration
    ///
    /// Uses `storage.path` when set, the user data directory otherwise.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => default_store_path()?,
        };
        Self::new_with_path(path, config.max_bytes)
    }

    /// Open (or create) a store at `path`
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::storage::{SessionStore, SledSessionStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledSessionStore::new_with_path(dir.path().join("session.db"), 1024).unwrap();
    /// assert!(store.load().is_none());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P, max_bytes: usize) -> Result<Self> {
        let path = path.into();
        let db = sled::open(&path).map_err(|e| {
            RagChatError::Storage(PersistenceError::Unavailable(format!(
                "Failed to open database at {}: {}",
                path.display(),
                e
            )))
        })?;

        tracing::debug!("Opened session store at {}", path.display());
        Ok(Self {
            db,
            path,
            max_bytes,
        })
    }

    /// Directory of the database
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_text(&self, key: &str) -> Option<String> {
        match self.db.get(key) {
            Ok(Some(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn load_record(&self) -> Option<SessionRecord> {
        match self.db.get(SESSION_KEY) {
            Ok(Some(bytes)) => decode_record(&bytes),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read stored session: {}", e);
                None
            }
        }
    }

    /// Import the three-key layout of the original browser client
    ///
    /// Counters that do not parse fall back to zero.
    fn load_legacy(&self) -> Option<Session> {
        let history = self.read_text(LEGACY_HISTORY_KEY)?;
        let messages: Vec<LegacyMessage> = match serde_json::from_str(&history) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Legacy chat history is unreadable ({}); starting empty", e);
                return None;
            }
        };

        let query_count = self
            .read_text(LEGACY_QUERY_COUNT_KEY)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let total = LEGACY_TOTAL_TIME_KEYS
            .iter()
            .find_map(|key| self.read_text(key))
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        tracing::info!("Imported {} messages from legacy history", messages.len());
        Some(Session::from_parts(
            messages.into_iter().map(Message::from).collect(),
            query_count,
            total,
        ))
    }
}

impl SessionStore for SledSessionStore {
    fn save(&self, session: &Session) -> std::result::Result<(), PersistenceError> {
        let bytes = encode_record(session, self.max_bytes)?;

        self.db
            .insert(SESSION_KEY, bytes)
            .map_err(|e| PersistenceError::Unavailable(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| PersistenceError::Unavailable(format!("Flush failed: {}", e)))?;

        tracing::debug!("Saved session with {} messages", session.len());
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        match self.db.get(SESSION_KEY) {
            Ok(Some(bytes)) => decode_record(&bytes).map(SessionRecord::into_session),
            Ok(None) => self.load_legacy(),
            Err(e) => {
                tracing::warn!("Failed to read stored session: {}", e);
                None
            }
        }
    }

    fn clear(&self) {
        let mut batch = sled::Batch::default();
        batch.remove(SESSION_KEY);
        batch.remove(LEGACY_HISTORY_KEY);
        batch.remove(LEGACY_QUERY_COUNT_KEY);
        for key in LEGACY_TOTAL_TIME_KEYS {
            batch.remove(key);
        }

        if let Err(e) = self.db.apply_batch(batch) {
            tracing::error!("Failed to clear stored session: {}", e);
            return;
        }
        if let Err(e) = self.db.flush() {
            tracing::error!("Failed to flush cleared session: {}", e);
        }
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.load_record().map(|record| record.saved_at)
    }
}

/// Session store that lives only as long as the process
#[derive(Debug)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Vec<u8>>>,
    max_bytes: usize,
}

impl MemorySessionStore {
    /// Create an empty store with the given byte quota
    pub fn new(max_bytes: usize) -> Self {
        Self {
            slot: Mutex::new(None),
            max_bytes,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(StorageConfig::default().max_bytes)
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> std::result::Result<(), PersistenceError> {
        let bytes = encode_record(session, self.max_bytes)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| PersistenceError::Unavailable("Store lock poisoned".to_string()))?;
        *slot = Some(bytes);
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        let slot = self.slot.lock().ok()?;
        slot.as_deref()
            .and_then(decode_record)
            .map(SessionRecord::into_session)
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        let slot = self.slot.lock().ok()?;
        slot.as_deref()
            .and_then(decode_record)
            .map(|record| record.saved_at)
    }
}

/// Stand-in used when the durable store cannot be opened
///
/// Every write fails with [`PersistenceError::Unavailable`], so the session
/// keeps working in memory and each failed write is reported.
#[derive(Debug, Clone)]
pub struct DisabledSessionStore {
    reason: String,
}

impl DisabledSessionStore {
    /// Create a disabled store remembering why storage is off
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SessionStore for DisabledSessionStore {
    fn save(&self, _session: &Session) -> std::result::Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable(self.reason.clone()))
    }

    fn load(&self) -> Option<Session> {
        None
    }

    fn clear(&self) {}
}

/// Open the store the application should use
///
/// Falls back to a [`DisabledSessionStore`] when the database cannot be
/// opened; storage problems never prevent chatting.
pub fn open_store(config: &StorageConfig, ephemeral: bool) -> Box<dyn SessionStore> {
    if ephemeral {
        tracing::debug!("Using in-memory session store");
        return Box::new(MemorySessionStore::new(config.max_bytes));
    }

    match SledSessionStore::new(config) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!("Session history will not be saved: {}", e);
            Box::new(DisabledSessionStore::new(e.to_string()))
        }
    }
}
