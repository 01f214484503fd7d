//! Show the state diff between two checkpoints

use crate::diff_utils;
use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use gcp_core::{ChannelChange, DiffOutcome, StateDiff};
use owo_colors::OwoColorize;

pub async fn run(
    opts: &StoreOpts,
    lineage: &str,
    checkpoint_a: &str,
    checkpoint_b: &str,
    patch: bool,
    context: usize,
) -> Result<()> {
    let lineage = util::parse_lineage(lineage)?;
    let store = util::open_store_read_only(opts)?;

    let id_a = util::resolve_checkpoint_ref(&store, checkpoint_a)?;
    let id_b = util::resolve_checkpoint_ref(&store, checkpoint_b)?;

    let diff = store
        .diff(&lineage, &id_a, &id_b)
        .with_context(|| format!("Failed to diff checkpoints in '{}'", lineage))?;

    for line in format_diff(&diff) {
        println!("{}", line);
    }

    if patch && diff.has_differences() {
        let old = store
            .read(&lineage, Some(&id_a))?
            .with_context(|| format!("Checkpoint not found: {}", id_a))?;
        let new = store
            .read(&lineage, Some(&id_b))?
            .with_context(|| format!("Checkpoint not found: {}", id_b))?;

        for change in diff.changes() {
            let channel = change.channel();
            let old_text = diff_utils::render_value(old.state.get(channel));
            let new_text = diff_utils::render_value(new.state.get(channel));
            println!();
            println!("  {}", channel.bold());
            print!("{}", diff_utils::generate_unified_diff(&old_text, &new_text, context));
        }
    }

    Ok(())
}

/// Plain-text report lines; only the id segments are colored
fn format_diff(diff: &StateDiff) -> Vec<String> {
    let mut lines = vec![format!(
        "Diff: {} → {}",
        diff.from.short().yellow(),
        diff.to.short().yellow()
    )];

    let changes = match &diff.outcome {
        DiffOutcome::NoDifferences => {
            lines.push("(no differences)".to_string());
            return lines;
        }
        DiffOutcome::Changed(changes) => changes,
    };

    for change in changes {
        match change {
            ChannelChange::Added { channel, value } => {
                lines.push(format!("{} {}: {}", "+".green(), channel, value));
            }
            ChannelChange::Removed { channel, value } => {
                lines.push(format!("{} {}: {}", "-".red(), channel, value));
            }
            ChannelChange::Sequence { channel, old_len, new_len, appended } => {
                let delta = *new_len as i64 - *old_len as i64;
                lines.push(format!(
                    "  {}: {} → {} items ({:+})",
                    channel, old_len, new_len, delta
                ));
                for item in appended {
                    lines.push(format!("    {} {}", "+".green(), item));
                }
            }
            ChannelChange::Modified { channel, old, new } => {
                lines.push(format!("{} {}: {} → {}", "~".yellow(), channel, old, new));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcp_core::CheckpointId;

    fn report(outcome: DiffOutcome) -> StateDiff {
        StateDiff {
            from: CheckpointId::from_bytes([1; 20]),
            to: CheckpointId::from_bytes([2; 20]),
            outcome,
        }
    }

    #[test]
    fn test_no_differences() {
        let lines = format_diff(&report(DiffOutcome::NoDifferences));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "(no differences)");
    }

    #[test]
    fn test_sequence_lines() {
        let lines = format_diff(&report(DiffOutcome::Changed(vec![ChannelChange::Sequence {
            channel: "messages".into(),
            old_len: 1,
            new_len: 2,
            appended: vec!["world".into()],
        }])));
        assert_eq!(lines[1], "  messages: 1 → 2 items (+1)");
        assert!(lines[2].ends_with("world"));
    }

    #[test]
    fn test_modified_line() {
        let lines = format_diff(&report(DiffOutcome::Changed(vec![ChannelChange::Modified {
            channel: "count".into(),
            old: "1".into(),
            new: "2".into(),
        }])));
        assert!(lines[1].ends_with("count: 1 → 2"));
    }
}
