//! Special commands parser for interactive chat mode
//!
//! Commands are prefixed with `/` and are case-insensitive. Everything else
//! typed at the prompt is a question for the backend.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the session or the display rather than being sent
/// to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Erase the conversation after confirmation
    Clear,

    /// Show the query counters
    Stats,

    /// Redraw the whole conversation
    History,

    /// List the example questions
    Examples,

    /// Send example question number `n` (1-based)
    Example(usize),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the backend as a question.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not
/// a valid command, `CommandError::MissingArgument` for a bare `/example` and
/// `CommandError::UnsupportedArgument` when its argument is not a positive
/// number.
///
/// # Examples
///
/// ```
/// use ragchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/clear").unwrap(), SpecialCommand::Clear);
/// assert_eq!(parse_special_command("/example 2").unwrap(), SpecialCommand::Example(2));
/// assert_eq!(parse_special_command("What is DNS?").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/clear" => Ok(SpecialCommand::Clear),
        "/stats" => Ok(SpecialCommand::Stats),
        "/history" => Ok(SpecialCommand::History),
        "/examples" => Ok(SpecialCommand::Examples),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "/example" => Err(CommandError::MissingArgument {
            command: "/example".to_string(),
            usage: "/example <number>".to_string(),
        }),
        input if input.starts_with("/example ") => {
            let arg = input[9..].trim();
            match arg.parse::<usize>() {
                Ok(n) if n > 0 => Ok(SpecialCommand::Example(n)),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/example".to_string(),
                    arg: arg.to_string(),
                }),
            }
        }

        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        input if input.starts_with('/') => {
            let cmd = input.split_whitespace().next().unwrap_or(input);
            Err(CommandError::UnknownCommand(cmd.to_string()))
        }

        _ => Ok(SpecialCommand::None),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CONVERSATION:
  /clear          - Erase the conversation (asks for confirmation)
  /history        - Show the whole conversation again
  /stats          - Show query count and response times

EXAMPLE QUESTIONS:
  /examples       - List example questions
  /example <n>    - Ask example question number n

OTHER:
  /help           - Show this help message
  exit, quit      - Leave the chat

Anything else you type is sent to the API server as a question.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clear() {
        assert_eq!(parse_special_command("/clear").unwrap(), SpecialCommand::Clear);
    }

    #[test]
    fn test_parse_stats_and_history() {
        assert_eq!(parse_special_command("/stats").unwrap(), SpecialCommand::Stats);
        assert_eq!(
            parse_special_command("/history").unwrap(),
            SpecialCommand::History
        );
    }

    #[test]
    fn test_parse_help_shorthand() {
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "quit", "/exit", "/quit", "EXIT"] {
            assert_eq!(
                parse_special_command(input).unwrap(),
                SpecialCommand::Exit,
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(parse_special_command("/CLEAR").unwrap(), SpecialCommand::Clear);
        assert_eq!(
            parse_special_command("  /Examples  ").unwrap(),
            SpecialCommand::Examples
        );
    }

    #[test]
    fn test_parse_example_with_number() {
        assert_eq!(
            parse_special_command("/example 3").unwrap(),
            SpecialCommand::Example(3)
        );
    }

    #[test]
    fn test_parse_example_without_number() {
        assert!(matches!(
            parse_special_command("/example"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_example_rejects_zero_and_text() {
        for input in ["/example 0", "/example two", "/example -1"] {
            assert!(matches!(
                parse_special_command(input),
                Err(CommandError::UnsupportedArgument { .. })
            ));
        }
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse_special_command("/foo bar"),
            Err(CommandError::UnknownCommand("/foo".to_string()))
        );
    }

    #[test]
    fn test_regular_question_is_not_a_command() {
        assert_eq!(
            parse_special_command("How does NAT work?").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(
            parse_special_command("exit strategies for IPv4").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_unknown_command_error_mentions_help() {
        let err = parse_special_command("/nope").unwrap_err();
        assert!(err.to_string().contains("/help"));
    }
}
