//! Line-by-line diffs of channel values

use owo_colors::OwoColorize;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

/// Pretty JSON of a channel value, one line per element, newline-terminated
pub fn render_value(value: Option<&Value>) -> String {
    match value {
        Some(value) => {
            let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            text.push('\n');
            text
        }
        None => String::new(),
    }
}

/// Unified diff with colored hunks, indented for display under a channel
pub fn generate_unified_diff(old_text: &str, new_text: &str, context_lines: usize) -> String {
    let diff = TextDiff::from_lines(old_text, new_text);
    let mut output = String::new();

    for (hunk_idx, hunk) in diff
        .unified_diff()
        .context_radius(context_lines)
        .iter_hunks()
        .enumerate()
    {
        if hunk_idx > 0 {
            output.push('\n');
        }

        let header = format!("{}", hunk.header());
        output.push_str(&format!("    {}\n", header.cyan()));

        for change in hunk.iter_changes() {
            let line: &str = change.value();
            match change.tag() {
                ChangeTag::Delete => output.push_str(&format!("    {}", format!("-{}", line).red())),
                ChangeTag::Insert => output.push_str(&format!("    {}", format!("+{}", line).green())),
                ChangeTag::Equal => output.push_str(&format!("    {}", format!(" {}", line).dimmed())),
            }
            if !line.ends_with('\n') {
                output.push('\n');
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(None), "");
        assert_eq!(render_value(Some(&json!([1, 2]))), "[\n  1,\n  2\n]\n");
    }

    #[test]
    fn test_unified_diff_shows_appended_element() {
        let old = render_value(Some(&json!(["hello"])));
        let new = render_value(Some(&json!(["hello", "world"])));

        let diff = generate_unified_diff(&old, &new, 1);
        assert!(diff.contains("\"world\""));
        assert!(diff.contains("@@"));
    }

    #[test]
    fn test_unified_diff_identical_is_empty() {
        let text = render_value(Some(&json!({"a": 1})));
        assert!(generate_unified_diff(&text, &text, 3).is_empty());
    }
}
