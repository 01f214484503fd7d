//! Core data model for git-backed checkpoints
//!
//! This crate provides:
//! - Content-derived checkpoint identifiers and lineage names
//! - Checkpoint records, pending writes and checkpoint references
//! - Deterministic commit messages
//! - Structural diffing of checkpoint state
//! - Bounded value summaries for presentation

pub mod checkpoint;
pub mod diff;
pub mod error;
pub mod id;
pub mod message;
pub mod summary;

// Re-exports
pub use checkpoint::{
    metadata_matches, Checkpoint, CheckpointRef, MergeStrategy, Metadata, PendingWrite,
    PendingWriteRecord, State,
};
pub use diff::{diff_states, ChannelChange, DiffOutcome, StateDiff};
pub use error::CoreError;
pub use id::{CheckpointId, LineageId};
pub use summary::{summarize_state, summarize_value, DEFAULT_SUMMARY_WIDTH};
