//! Bounded one-line renderings of state values

use crate::State;
use serde_json::Value;

/// Default width of a value summary in characters
pub const DEFAULT_SUMMARY_WIDTH: usize = 80;

/// Short rendering of a value: sequences show their length, everything
/// else is cut to `width` characters with a trailing `...`
pub fn summarize_value(value: &Value, width: usize) -> String {
    let text = match value {
        Value::Array(items) => return format!("[{} items]", items.len()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate(&text, width)
}

/// Per-channel summary of a whole state, e.g. `messages: 3 items, count: 2`
pub fn summarize_state(state: &State, width: usize) -> String {
    if state.is_empty() {
        return "(empty state)".to_string();
    }
    state
        .iter()
        .map(|(channel, value)| match value {
            Value::Array(items) => format!("{channel}: {} items", items.len()),
            other => format!("{channel}: {}", summarize_value(other, width)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width).collect();
    out.push_str("...");
    out
}
