//! RAGChat - terminal client for a RAG question-answering service
//!
//! This library provides the conversation session manager behind the
//! `ragchat` binary: session state, its persistence, the controller that
//! drives the submit/response cycle, and terminal presentation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `conversation`: Session state and the conversation controller
//! - `backend`: HTTP client for the question-answering service
//! - `storage`: Durable session store (sled) with legacy import
//! - `presentation`: Presenter trait, terminal rendering and formatting
//! - `commands`: CLI command handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use ragchat::backend::create_backend;
//! use ragchat::conversation::ConversationController;
//! use ragchat::presentation::TerminalPresenter;
//! use ragchat::storage::open_store;
//! use ragchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let backend = create_backend(&config.backend)?;
//!     let store = open_store(&config.storage, false);
//!     let presenter = TerminalPresenter::stdout(config.chat.example_prompts.clone());
//!     let mut controller = ConversationController::new(backend, store, presenter);
//!
//!     controller.startup().await;
//!     controller.submit("What is IPv4?").await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod presentation;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use conversation::{ConversationController, Session};
pub use error::{BackendError, PersistenceError, RagChatError, Result};

#[cfg(test)]
pub mod test_utils;
