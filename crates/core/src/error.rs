//! Validation errors for identifiers and names

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid checkpoint id '{0}': expected 40 hex characters")]
    InvalidCheckpointId(String),

    #[error("invalid checkpoint prefix '{0}': expected 4 to 40 hex characters")]
    InvalidCheckpointPrefix(String),

    #[error("invalid lineage name '{name}': {reason}")]
    InvalidLineageName { name: String, reason: &'static str },

    #[error("unknown merge strategy '{0}' (expected 'ours' or 'theirs')")]
    UnknownMergeStrategy(String),
}
