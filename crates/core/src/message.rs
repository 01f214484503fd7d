//! Deterministic commit messages
//!
//! Messages double as the commit kind marker: pending-write commits are
//! recognised by their prefix and never treated as checkpoints.

use crate::checkpoint::{Metadata, SOURCE_KEY, STEP_KEY};
use crate::{LineageId, MergeStrategy};
use serde_json::Value;

pub const ROOT_MESSAGE: &str = "Initial commit";
pub const CHECKPOINT_PREFIX: &str = "checkpoint: ";
pub const WRITES_PREFIX: &str = "writes: ";
pub const MERGE_PREFIX: &str = "merge: ";

/// Longest label kept as a commit subject
pub const LABEL_MAX_CHARS: usize = 80;

/// `checkpoint: source=<source> step=<step>`
pub fn checkpoint_message(metadata: &Metadata) -> String {
    let source = metadata
        .get(SOURCE_KEY)
        .map(render_scalar)
        .unwrap_or_else(|| "checkpoint".to_string());
    let step = metadata
        .get(STEP_KEY)
        .map(render_scalar)
        .unwrap_or_else(|| "0".to_string());
    format!("{CHECKPOINT_PREFIX}source={source} step={step}")
}

/// `writes: task=<task_id>`
pub fn writes_message(task_id: &str) -> String {
    format!("{WRITES_PREFIX}task={task_id}")
}

/// `merge: <source> into <target> (strategy=<strategy>)`
pub fn merge_message(source: &LineageId, target: &LineageId, strategy: MergeStrategy) -> String {
    format!("{MERGE_PREFIX}{source} into {target} (strategy={strategy})")
}

/// Label text cut to a single subject line
pub fn label_message(label: &str) -> String {
    let subject = label.lines().next().unwrap_or_default();
    let subject: String = subject.chars().take(LABEL_MAX_CHARS).collect();
    // a label must never read as a pending-write commit
    if is_writes_message(&subject) {
        format!("label: {subject}")
    } else {
        subject
    }
}

pub fn is_writes_message(message: &str) -> bool {
    message.starts_with(WRITES_PREFIX)
}

/// First line of a commit message, cut to `width` characters
pub fn subject(message: &str, width: usize) -> String {
    message
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(width)
        .collect()
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
