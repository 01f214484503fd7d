//! Checkpoint store over a git commit graph
//!
//! This crate provides:
//! - `CheckpointStore`: the process-wide store handle
//! - Checkpoint writes, pending-write appends and labels (serialized)
//! - Lock-free reads and lazy, filterable history listing
//! - Lineage fork, merge, diff and delete
//! - Store configuration (TOML) and the typed error taxonomy

pub mod config;
pub mod error;
pub mod lineage;
pub mod reader;
pub mod store;
pub mod writer;

// Re-exports
pub use config::{ConfigError, StoreConfig};
pub use error::{ErrorClass, Result, StoreError};
pub use reader::{CheckpointIter, ListQuery};
pub use store::{CheckpointStore, LineageSummary};

/// Tree path of the serialized state
pub const STATE_FILE: &str = "state.json";
/// Tree path of the serialized metadata
pub const METADATA_FILE: &str = "metadata.json";
/// Tree path of the pending-writes list
pub const PENDING_WRITES_FILE: &str = "pending_writes.json";
