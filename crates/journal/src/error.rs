//! Store error taxonomy

use backend::{BackendError, Contended};
use gcp_core::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("lineage '{0}' not found")]
    LineageNotFound(String),

    #[error("checkpoint '{0}' not found")]
    CheckpointNotFound(String),

    #[error("lineage '{0}' already exists")]
    LineageAlreadyExists(String),

    #[error("merging '{from_lineage}' into '{into_lineage}' conflicted on {paths:?}; merge was rolled back")]
    MergeConflict {
        from_lineage: String,
        into_lineage: String,
        paths: Vec<String>,
    },

    #[error(transparent)]
    InvalidLineageName(CoreError),

    #[error(transparent)]
    InvalidCheckpointId(CoreError),

    #[error("checkpoint prefix '{0}' matches more than one commit")]
    AmbiguousCheckpointId(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("failed to (de)serialize checkpoint payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend failure: {0}")]
    BackendIo(#[from] BackendError),
}

/// Response class a boundary layer should report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller mistake: bad id, duplicate name, conflicting merge
    Client,
    /// Storage or serialization fault
    Server,
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::LineageNotFound(_)
            | StoreError::CheckpointNotFound(_)
            | StoreError::LineageAlreadyExists(_)
            | StoreError::MergeConflict { .. }
            | StoreError::InvalidLineageName(_)
            | StoreError::InvalidCheckpointId(_)
            | StoreError::AmbiguousCheckpointId(_) => ErrorClass::Client,
            StoreError::Config(_) | StoreError::Serialization(_) | StoreError::BackendIo(_) => {
                ErrorClass::Server
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::LineageNotFound(_) | StoreError::CheckpointNotFound(_)
        )
    }
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidLineageName { .. } => StoreError::InvalidLineageName(err),
            _ => StoreError::InvalidCheckpointId(err),
        }
    }
}

impl Contended for StoreError {
    fn is_lock_contention(&self) -> bool {
        matches!(self, StoreError::BackendIo(e) if e.is_lock_contention())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcp_core::LineageId;

    #[test]
    fn test_error_classes() {
        assert_eq!(StoreError::LineageNotFound("t".into()).class(), ErrorClass::Client);
        assert_eq!(
            StoreError::MergeConflict {
                from_lineage: "a".into(),
                into_lineage: "b".into(),
                paths: vec![],
            }
            .class(),
            ErrorClass::Client
        );
        let io = StoreError::BackendIo(BackendError::Io(std::io::Error::other("disk")));
        assert_eq!(io.class(), ErrorClass::Server);
        assert!(!io.is_lock_contention());
    }

    #[test]
    fn test_core_errors_are_routed() {
        let err: StoreError = LineageId::new("a/b").unwrap_err().into();
        assert!(matches!(err, StoreError::InvalidLineageName(_)));

        let err: StoreError = gcp_core::CheckpointId::from_hex("xyz").unwrap_err().into();
        assert!(matches!(err, StoreError::InvalidCheckpointId(_)));
        assert_eq!(err.class(), ErrorClass::Client);
    }

    #[test]
    fn test_locked_backend_error_is_contention() {
        let locked = git2::Error::new(git2::ErrorCode::Locked, git2::ErrorClass::Index, "locked");
        let err = StoreError::BackendIo(BackendError::Git(locked));
        assert!(err.is_lock_contention());
    }
}
