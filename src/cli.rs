//! Command-line interface definition for RAGChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, session
//! history management, and backend status.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RAGChat - terminal client for a RAG question-answering service
///
/// Ask questions, see answers with their retrieval metadata, and keep the
/// conversation across runs.
#[derive(Parser, Debug, Clone)]
#[command(name = "ragchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// Override the session database directory
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Keep the session in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for RAGChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Inspect or clear the saved conversation
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Check backend health and knowledge base size
    Status,
}

/// Session history subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    /// Print the saved conversation
    Show,

    /// Print query count and response time statistics
    Stats,

    /// Delete the saved conversation
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_base: None,
            storage_path: None,
            ephemeral: false,
            command: Commands::Chat,
        }
    }
}
