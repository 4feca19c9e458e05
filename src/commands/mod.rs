/*!
Command handlers for the CLI

- `chat`: interactive chat session
- `ask`: one question, one answer
- `status`: backend health and knowledge base size
- `history`: inspect or clear the saved conversation

Handlers wire the library components together: backend, session store,
conversation controller and terminal presenter.
*/

use crate::backend::create_backend;
use crate::config::Config;
use crate::conversation::ConversationController;
use crate::error::{RagChatError, Result};
use crate::presentation::{clamp_input, input_counter, TerminalPresenter};
use crate::storage::open_store;
use colored::Colorize;

// Special commands parser for the chat prompt
pub mod special_commands;

// Saved conversation commands
pub mod history;

/// Build a controller that renders to standard output
fn terminal_controller(
    config: &Config,
    ephemeral: bool,
) -> Result<ConversationController<TerminalPresenter>> {
    let backend = create_backend(&config.backend)?;
    let store = open_store(&config.storage, ephemeral);
    let presenter = TerminalPresenter::stdout(config.chat.example_prompts.clone());

    Ok(ConversationController::new(backend, store, presenter)
        .with_notification_duration(config.chat.notification_duration()))
}

/// Enforce the input length limit, warning when text is cut
fn limit_question(text: &str, max_chars: usize) -> String {
    let (question, cut) = clamp_input(text, max_chars);
    if cut {
        println!(
            "{}",
            format!("Question truncated to {} characters", max_chars).yellow()
        );
    }
    question
}

/// Whether a confirmation answer means yes
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Restores the saved conversation, checks the backend, then runs a
    //! readline loop that sends each question through the conversation
    //! controller.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::presentation::format_stats;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::time::Instant;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `ephemeral` - Keep the session in memory only
    pub async fn run_chat(config: Config, ephemeral: bool) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let max_chars = config.chat.max_input_chars;
        let mut controller = terminal_controller(&config, ephemeral)?;
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config);
        controller.startup().await;

        loop {
            let alerting = !controller
                .presenter_mut()
                .active_notifications(Instant::now())
                .is_empty();
            let prompt = chat_prompt(alerting);

            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let question = match parse_special_command(trimmed) {
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Clear) => {
                            let confirmed = rl
                                .readline("Clear all chat history? [y/N] ")
                                .map(|answer| is_affirmative(&answer))
                                .unwrap_or(false);
                            if confirmed {
                                if controller.clear() {
                                    println!("{}", "Chat history cleared.".green());
                                }
                            } else {
                                println!("Cancelled.");
                            }
                            continue;
                        }
                        Ok(SpecialCommand::Stats) => {
                            println!("{}", format_stats(&controller.stats()));
                            continue;
                        }
                        Ok(SpecialCommand::History) => {
                            controller.render();
                            continue;
                        }
                        Ok(SpecialCommand::Examples) => {
                            controller.presenter_mut().render_examples();
                            continue;
                        }
                        Ok(SpecialCommand::Example(n)) => {
                            match config.chat.example_prompts.get(n - 1) {
                                Some(prompt) => prompt.clone(),
                                None => {
                                    eprintln!(
                                        "{}",
                                        format!(
                                            "No example {} (there are {})",
                                            n,
                                            config.chat.example_prompts.len()
                                        )
                                        .red()
                                    );
                                    continue;
                                }
                            }
                        }
                        Ok(SpecialCommand::None) => trimmed.to_string(),
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    remember_line(rl.add_history_entry(question.as_str()));

                    let question = limit_question(&question, max_chars);
                    println!("{}", input_counter(&question, max_chars).dimmed());
                    controller.submit(&question).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Line-history failures are logged; the chat keeps going
    fn remember_line(result: rustyline::Result<bool>) -> bool {
        match result {
            Ok(added) => added,
            Err(e) => {
                tracing::warn!("Could not record line history: {}", e);
                false
            }
        }
    }

    /// Prompt string; marked while a notification is visible
    fn chat_prompt(alerting: bool) -> String {
        if alerting {
            format!("{} {} ", "[!]".red().bold(), ">".cyan().bold())
        } else {
            format!("{} ", ">".cyan().bold())
        }
    }

    fn print_welcome_banner(config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  RAGChat - Knowledge Q&A                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("API server: {}", config.backend.base_url.cyan());
        println!(
            "Type '/help' for available commands, 'exit' to quit (max {} characters per question)\n",
            config.chat.max_input_chars
        );
    }

}

// One-shot question handler
pub mod ask {
    //! Send one question through the same controller as the chat mode, so
    //! the exchange lands in the saved conversation.

    use super::*;
    use crate::conversation::SubmitOutcome;

    /// Ask a single question
    ///
    /// # Errors
    ///
    /// Returns the backend error when the question could not be answered.
    pub async fn run_ask(config: Config, question: &str, ephemeral: bool) -> Result<()> {
        let mut controller = terminal_controller(&config, ephemeral)?;
        controller.restore();

        let question = limit_question(question, config.chat.max_input_chars);
        match controller.submit(&question).await {
            SubmitOutcome::Answered { .. } => Ok(()),
            SubmitOutcome::Failed(e) => Err(RagChatError::Backend(e).into()),
            SubmitOutcome::Ignored => {
                Err(RagChatError::Input("Question must not be empty".to_string()).into())
            }
            SubmitOutcome::Busy => Err(RagChatError::Input(
                "A question is already in progress".to_string(),
            )
            .into()),
        }
    }
}

// Backend status handler
pub mod status {
    //! Report whether the API server is reachable and how much it knows.

    use super::*;

    /// Print backend health and knowledge count
    ///
    /// # Errors
    ///
    /// Returns the backend error when the health check fails.
    pub async fn run_status(config: Config) -> Result<()> {
        let backend = create_backend(&config.backend)?;

        println!("API server: {}", config.backend.base_url.cyan());
        let health = backend.health().await;
        match &health {
            Ok(()) => println!("Health:     {}", "reachable".green()),
            Err(e) => println!("Health:     {}", e.to_string().red()),
        }

        match backend.knowledge_count().await {
            Ok(count) => println!("Knowledge:  {} points", count),
            Err(e) => {
                tracing::debug!("Knowledge count unavailable: {}", e);
                println!("Knowledge:  {}", "unknown".dimmed());
            }
        }

        health.map_err(|e| RagChatError::Backend(e).into())
    }
}
