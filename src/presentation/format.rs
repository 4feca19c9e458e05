//! Pure text formatting for messages and counters
//!
//! Missing optional metadata is always spelled out as [`UNKNOWN`]; nothing
//! is silently left out.

use crate::conversation::{Metadata, SessionStats};

/// Sentinel shown for absent metadata fields
pub const UNKNOWN: &str = "unknown";

/// Placeholder for a counter that is not defined yet
pub const NO_VALUE: &str = "-";

/// Placeholder for an answer with no text
pub const EMPTY_CONTENT: &str = "(empty)";

fn format_dimension(value: Option<f64>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}

/// Seconds with two decimals, e.g. `0.42s`
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.2}s", seconds)
}

/// One-line summary of answer metadata
///
/// # Examples
///
/// ```
/// use ragchat::conversation::Metadata;
/// use ragchat::presentation::format_metadata;
///
/// let meta = Metadata {
///     response_time_seconds: 0.42,
///     matched_document_count: 2,
///     scenario: None,
///     dimensions: None,
/// };
/// assert_eq!(
///     format_metadata(&meta),
///     "0.42s | 2 documents | scenario: unknown | K: unknown  C: unknown  R: unknown"
/// );
/// ```
pub fn format_metadata(meta: &Metadata) -> String {
    let dims = meta.dimensions.unwrap_or_default();
    format!(
        "{} | {} documents | scenario: {} | K: {}  C: {}  R: {}",
        format_seconds(meta.response_time_seconds),
        meta.matched_document_count,
        meta.scenario.as_deref().unwrap_or(UNKNOWN),
        format_dimension(dims.k),
        format_dimension(dims.c),
        format_dimension(dims.r),
    )
}

/// Counter summary; the average reads `-` before the first query
pub fn format_stats(stats: &SessionStats) -> String {
    format!(
        "Queries: {} | Average: {} | Last: {}",
        stats.query_count,
        stats
            .average_response_time
            .map_or_else(|| NO_VALUE.to_string(), format_seconds),
        stats
            .last_response_time
            .map_or_else(|| NO_VALUE.to_string(), format_seconds),
    )
}

/// Character counter such as `42 / 500`
pub fn input_counter(text: &str, max_chars: usize) -> String {
    format!("{} / {}", text.chars().count(), max_chars)
}

/// Cut `text` to at most `max_chars` characters
///
/// Returns the kept text and whether anything was cut.
pub fn clamp_input(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (text[..idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Message text, or a placeholder when the text is blank
pub fn display_content(content: &str) -> &str {
    if content.trim().is_empty() {
        EMPTY_CONTENT
    } else {
        content
    }
}
