//! Git storage backend for checkpoint lineages
//!
//! This crate provides:
//! - Repository lifecycle (init, validation, self-healing reinitialization)
//! - Stale lock cleanup and bounded retry on lock contention
//! - Branch CRUD, blob reads at a commit, history walks
//! - Staging + commit on the active branch
//! - Strategy merges with abort/rollback on conflict

pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod merge;
pub mod repo;

// Re-exports
pub use error::{BackendError, Contended, Result};
pub use lifecycle::RepoState;
pub use repo::{Backend, BackendSettings, CommitInfo};
