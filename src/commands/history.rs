use super::is_affirmative;
use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::conversation::Session;
use crate::error::Result;
use crate::presentation::format::{format_seconds, NO_VALUE};
use crate::presentation::{Presenter, TerminalPresenter};
use crate::storage::open_store;
use chrono::{DateTime, Utc};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(config: &Config, command: HistoryCommand, ephemeral: bool) -> Result<()> {
    let store = open_store(&config.storage, ephemeral);

    match command {
        HistoryCommand::Show => {
            let session = store.load().unwrap_or_default();
            if session.is_empty() {
                println!("{}", "No chat history found.".yellow());
                return Ok(());
            }

            let mut presenter = TerminalPresenter::stdout(config.chat.example_prompts.clone());
            presenter.render_session(&session);
            presenter.render_stats(&session.stats());
        }
        HistoryCommand::Stats => {
            let session = store.load().unwrap_or_default();
            let table = stats_table(&session, store.saved_at());
            println!("\nChat Statistics:");
            table.printstd();
            println!();
        }
        HistoryCommand::Clear { yes } => {
            if !yes && !confirm_clear()? {
                println!("Cancelled.");
                return Ok(());
            }
            store.clear();
            println!("{}", "Chat history cleared.".green());
        }
    }

    Ok(())
}

/// Build the statistics table for a saved session
pub fn stats_table(session: &Session, saved_at: Option<DateTime<Utc>>) -> Table {
    let stats = session.stats();
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row!["Queries".bold(), stats.query_count]);
    table.add_row(prettytable::row!["Messages".bold(), session.len()]);
    table.add_row(prettytable::row![
        "Average response".bold(),
        stats
            .average_response_time
            .map_or_else(|| NO_VALUE.to_string(), format_seconds)
    ]);
    table.add_row(prettytable::row![
        "Last response".bold(),
        stats
            .last_response_time
            .map_or_else(|| NO_VALUE.to_string(), format_seconds)
    ]);
    table.add_row(prettytable::row![
        "Last saved".bold(),
        saved_at.map_or_else(
            || NO_VALUE.to_string(),
            |t| t.format("%Y-%m-%d %H:%M").to_string()
        )
    ]);

    table
}

fn confirm_clear() -> Result<bool> {
    let mut rl = rustyline::DefaultEditor::new()?;
    Ok(rl
        .readline("Clear all chat history? [y/N] ")
        .map(|answer| is_affirmative(&answer))
        .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Message, Metadata};

    #[test]
    fn test_stats_table_for_empty_session() {
        let table = stats_table(&Session::new(), None);
        let text = table.to_string();
        assert_eq!(table.len(), 5);
        assert!(text.contains("Queries"));
        assert!(text.contains('-'));
    }

    #[test]
    fn test_stats_table_with_queries() {
        let mut session = Session::new();
        session.append(Message::user("q"));
        session.append(Message::assistant(
            "a",
            Metadata {
                response_time_seconds: 0.5,
                matched_document_count: 1,
                scenario: None,
                dimensions: None,
            },
        ));
        session.record_query(0.5);

        let text = stats_table(&session, Some(Utc::now())).to_string();
        assert!(text.contains("0.50s"));
    }

    #[test]
    fn test_clear_with_yes_on_ephemeral_store() {
        let config = Config::default();
        assert!(handle_history(&config, HistoryCommand::Clear { yes: true }, true).is_ok());
    }

    #[test]
    fn test_show_empty_history() {
        let config = Config::default();
        assert!(handle_history(&config, HistoryCommand::Show, true).is_ok());
    }
}
