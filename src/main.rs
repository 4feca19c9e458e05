//! RAGChat - terminal client for a RAG question-answering service
//!
#![doc = "RAGChat - terminal client for a RAG question-answering service"]
#![doc = "Main entry point for the ragchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ragchat::cli::{Cli, Commands};
use ragchat::commands;
use ragchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat => {
            commands::chat::run_chat(config, cli.ephemeral).await?;
            Ok(())
        }
        Commands::Ask { question } => {
            let question = question.join(" ");
            tracing::debug!("One-shot question ({} chars)", question.chars().count());
            commands::ask::run_ask(config, &question, cli.ephemeral).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, command, cli.ephemeral)?;
            Ok(())
        }
        Commands::Status => {
            commands::status::run_status(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never mix with answers on stdout.
/// `RAGCHAT_LOG_JSON=1` switches to JSON lines.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "ragchat=debug" } else { "ragchat=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let json = std::env::var("RAGCHAT_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
