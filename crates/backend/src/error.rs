//! Backend error types

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to initialize repository at {0}: {1}")]
    Init(PathBuf, #[source] git2::Error),

    #[error("repository at {0} has no working directory")]
    Bare(PathBuf),

    #[error("root branch '{0}' is missing")]
    MissingRoot(String),

    #[error("ambiguous commit prefix '{0}'")]
    AmbiguousPrefix(String),

    #[error("object id is not a 20-byte sha1: {0}")]
    UnsupportedObjectId(String),

    #[error("merge conflict in {paths:?}")]
    MergeConflict { paths: Vec<String> },

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that may clear up once another lock holder finishes
pub trait Contended {
    fn is_lock_contention(&self) -> bool;
}

impl Contended for BackendError {
    fn is_lock_contention(&self) -> bool {
        matches!(self, BackendError::Git(e) if e.code() == git2::ErrorCode::Locked)
    }
}
