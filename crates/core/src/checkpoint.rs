//! Checkpoint data structures

use crate::{CheckpointId, CoreError, LineageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Application state: channel name -> value
pub type State = serde_json::Map<String, Value>;

/// Checkpoint metadata: at least `source` and `step`
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key naming why the checkpoint was produced
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the caller-supplied step
pub const STEP_KEY: &str = "step";
/// Metadata key the namespace is recorded under
pub const NAMESPACE_KEY: &str = "checkpoint_ns";
/// Metadata key for labelled checkpoints
pub const LABEL_KEY: &str = "label";

/// Addresses a lineage, its namespace and optionally one checkpoint in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRef {
    pub lineage: LineageId,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<CheckpointId>,
}

impl CheckpointRef {
    /// Reference to the head of a lineage in the default namespace
    pub fn latest(lineage: LineageId) -> Self {
        Self {
            lineage,
            namespace: String::new(),
            checkpoint_id: None,
        }
    }

    /// Reference to a specific checkpoint in a lineage
    pub fn at(lineage: LineageId, checkpoint_id: CheckpointId) -> Self {
        Self {
            lineage,
            namespace: String::new(),
            checkpoint_id: Some(checkpoint_id),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// A side effect recorded between two full-state checkpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub task_id: String,
    pub channel: String,
    pub value: Value,
}

/// On-disk form of a pending write, tagged with the checkpoint it was
/// produced against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWriteRecord {
    pub task_id: String,
    #[serde(default)]
    pub task_path: String,
    pub channel: String,
    pub value: Value,
    #[serde(default)]
    pub checkpoint_id: Option<String>,
}

impl From<PendingWriteRecord> for PendingWrite {
    fn from(record: PendingWriteRecord) -> Self {
        Self {
            task_id: record.task_id,
            channel: record.channel,
            value: record.value,
        }
    }
}

/// An immutable state snapshot with metadata and parent linkage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Content-derived id assigned by the backend
    pub id: CheckpointId,
    /// Lineage the checkpoint was read through
    pub lineage: LineageId,
    /// Namespace echoed from the request
    pub namespace: String,
    /// Application payload
    pub state: State,
    /// Metadata as stored (includes `checkpoint_ns`)
    pub metadata: Metadata,
    /// Side effects not yet folded into `state`
    pub pending_writes: Vec<PendingWrite>,
    /// Preceding checkpoint in the same lineage
    pub parent_id: Option<CheckpointId>,
    /// Commit time (Unix seconds)
    pub created_at: i64,
}

impl Checkpoint {
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }

    pub fn step(&self) -> Option<i64> {
        self.metadata.get(STEP_KEY).and_then(Value::as_i64)
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.get(LABEL_KEY).and_then(Value::as_str)
    }

    /// Reference that addresses exactly this checkpoint
    pub fn reference(&self) -> CheckpointRef {
        CheckpointRef {
            lineage: self.lineage.clone(),
            namespace: self.namespace.clone(),
            checkpoint_id: Some(self.id),
        }
    }

    pub fn parent_reference(&self) -> Option<CheckpointRef> {
        self.parent_id.map(|id| CheckpointRef {
            lineage: self.lineage.clone(),
            namespace: self.namespace.clone(),
            checkpoint_id: Some(id),
        })
    }
}

/// Exact-match conjunction of `filter` over `metadata`
///
/// A filter value of `null` also matches a key that is absent.
pub fn metadata_matches(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, expected)| metadata.get(key).unwrap_or(&Value::Null) == expected)
}

/// How a merge resolves the resulting state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Keep the target's state, record the merge
    #[default]
    Ours,
    /// Replace the target's state with the source's
    Theirs,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Ours => "ours",
            MergeStrategy::Theirs => "theirs",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ours" => Ok(MergeStrategy::Ours),
            "theirs" => Ok(MergeStrategy::Theirs),
            other => Err(CoreError::UnknownMergeStrategy(other.to_string())),
        }
    }
}
