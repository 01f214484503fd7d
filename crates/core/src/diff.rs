//! Structural comparison of two checkpoint states

use crate::summary::summarize_value;
use crate::{CheckpointId, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Per-channel difference between two states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelChange {
    /// Channel present only in the newer state
    Added { channel: String, value: String },
    /// Channel present only in the older state
    Removed { channel: String, value: String },
    /// Both values are sequences; `appended` lists new trailing elements
    /// when the newer one is longer
    Sequence {
        channel: String,
        old_len: usize,
        new_len: usize,
        appended: Vec<String>,
    },
    /// Any other change, as old and new summaries
    Modified {
        channel: String,
        old: String,
        new: String,
    },
}

impl ChannelChange {
    pub fn channel(&self) -> &str {
        match self {
            ChannelChange::Added { channel, .. }
            | ChannelChange::Removed { channel, .. }
            | ChannelChange::Sequence { channel, .. }
            | ChannelChange::Modified { channel, .. } => channel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "changes", rename_all = "snake_case")]
pub enum DiffOutcome {
    NoDifferences,
    Changed(Vec<ChannelChange>),
}

/// Diff report between two checkpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiff {
    pub from: CheckpointId,
    pub to: CheckpointId,
    pub outcome: DiffOutcome,
}

impl StateDiff {
    pub fn has_differences(&self) -> bool {
        matches!(self.outcome, DiffOutcome::Changed(_))
    }

    pub fn changes(&self) -> &[ChannelChange] {
        match &self.outcome {
            DiffOutcome::NoDifferences => &[],
            DiffOutcome::Changed(changes) => changes,
        }
    }
}

/// Compare channels of `old` and `new`, in channel-name order
pub fn diff_states(old: &State, new: &State, width: usize) -> DiffOutcome {
    let channels: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut changes = Vec::new();

    for channel in channels {
        let change = match (old.get(channel), new.get(channel)) {
            (Some(a), Some(b)) if a == b => continue,
            (None, Some(b)) => ChannelChange::Added {
                channel: channel.clone(),
                value: summarize_value(b, width),
            },
            (Some(a), None) => ChannelChange::Removed {
                channel: channel.clone(),
                value: summarize_value(a, width),
            },
            (Some(Value::Array(a)), Some(Value::Array(b))) => ChannelChange::Sequence {
                channel: channel.clone(),
                old_len: a.len(),
                new_len: b.len(),
                appended: b
                    .iter()
                    .skip(a.len())
                    .map(|item| summarize_value(item, width))
                    .collect(),
            },
            (Some(a), Some(b)) => ChannelChange::Modified {
                channel: channel.clone(),
                old: summarize_value(a, width),
                new: summarize_value(b, width),
            },
            (None, None) => continue,
        };
        changes.push(change);
    }

    if changes.is_empty() {
        DiffOutcome::NoDifferences
    } else {
        DiffOutcome::Changed(changes)
    }
}
