//! Configuration management for RAGChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{RagChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for RAGChat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Question-answering service settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Session persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the service (endpoints are appended to it)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout enforced by the HTTP client (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the session database; the user data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Largest serialized session accepted by a write (bytes)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024 // 5 MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: default_max_bytes(),
        }
    }
}

/// Interactive chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum characters accepted per question
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// How long an error notification stays visible (seconds)
    #[serde(default = "default_notification_seconds")]
    pub notification_seconds: u64,

    /// Quick-send example questions
    #[serde(default = "default_example_prompts")]
    pub example_prompts: Vec<String>,
}

fn default_max_input_chars() -> usize {
    500
}

fn default_notification_seconds() -> u64 {
    5
}

fn default_example_prompts() -> Vec<String> {
    vec![
        "What are IPv4 and IPv6?".to_string(),
        "How do NAT and PAT differ?".to_string(),
        "Explain the full DNS resolution process".to_string(),
    ]
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            notification_seconds: default_notification_seconds(),
            example_prompts: default_example_prompts(),
        }
    }
}

impl ChatConfig {
    /// Display duration of a notification
    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_seconds)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RagChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("RAGCHAT_API_BASE") {
            tracing::debug!(base_url = %base_url, "Env override: RAGCHAT_API_BASE");
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("RAGCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid RAGCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(path) = std::env::var("RAGCHAT_STORAGE_PATH") {
            tracing::debug!(path = %path, "Env override: RAGCHAT_STORAGE_PATH");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(max_bytes) = std::env::var("RAGCHAT_STORAGE_MAX_BYTES") {
            if let Ok(value) = max_bytes.parse() {
                self.storage.max_bytes = value;
            } else {
                tracing::warn!("Invalid RAGCHAT_STORAGE_MAX_BYTES: {}", max_bytes);
            }
        }

        if let Ok(max_chars) = std::env::var("RAGCHAT_MAX_INPUT_CHARS") {
            if let Ok(value) = max_chars.parse() {
                self.chat.max_input_chars = value;
            } else {
                tracing::warn!("Invalid RAGCHAT_MAX_INPUT_CHARS: {}", max_chars);
            }
        }

        if let Ok(seconds) = std::env::var("RAGCHAT_NOTIFICATION_SECONDS") {
            if let Ok(value) = seconds.parse() {
                self.chat.notification_seconds = value;
            } else {
                tracing::warn!("Invalid RAGCHAT_NOTIFICATION_SECONDS: {}", seconds);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_base) = &cli.api_base {
            tracing::debug!("Using API base override from CLI: {}", api_base);
            self.backend.base_url = api_base.clone();
        }

        if let Some(storage_path) = &cli.storage_path {
            tracing::debug!("Using storage path override from CLI: {}", storage_path.display());
            self.storage.path = Some(storage_path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.backend.base_url).map_err(|e| {
            RagChatError::Config(format!(
                "Invalid backend.base_url '{}': {}",
                self.backend.base_url, e
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RagChatError::Config(format!(
                "backend.base_url must use http or https, got: {}",
                url.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(RagChatError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.max_bytes == 0 {
            return Err(RagChatError::Config(
                "storage.max_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.max_input_chars == 0 {
            return Err(RagChatError::Config(
                "chat.max_input_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.notification_seconds == 0 {
            return Err(RagChatError::Config(
                "chat.notification_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
