//! Store configuration
//!
//! Loaded from TOML; every key is optional and falls back to its default.
//!
//! ```toml
//! repo_path = ".conversations"
//! branch_prefix = "thread-"
//! root_branch = "main"
//! lock_retries = 3
//! lock_backoff_ms = 50
//! author_name = "gitcheckpoint"
//! author_email = "gitcheckpoint@localhost"
//! summary_width = 80
//! ```

use backend::BackendSettings;
use gcp_core::LineageId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the checkpoint repository
    pub repo_path: PathBuf,
    /// Prepended to lineage names to form branch names
    pub branch_prefix: String,
    /// Branch with the placeholder root commit; never a lineage
    pub root_branch: String,
    /// Attempts per mutation while the repository is locked (1-10)
    pub lock_retries: u32,
    /// Backoff before the first retry, doubled per attempt (1-5000 ms)
    pub lock_backoff_ms: u64,
    pub author_name: String,
    pub author_email: String,
    /// Width of value summaries in diffs (8-1000)
    pub summary_width: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let settings = BackendSettings::default();
        Self {
            repo_path: PathBuf::from(".conversations"),
            branch_prefix: "thread-".to_string(),
            root_branch: settings.root_branch,
            lock_retries: settings.lock_retries,
            lock_backoff_ms: settings.lock_backoff_ms,
            author_name: settings.author_name,
            author_email: settings.author_email,
            summary_width: gcp_core::DEFAULT_SUMMARY_WIDTH,
        }
    }
}

impl StoreConfig {
    /// Defaults with a different repository directory
    pub fn at(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            ..Self::default()
        }
    }

    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: StoreConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=10).contains(&self.lock_retries) {
            return Err(ConfigError::Invalid(format!(
                "lock_retries must be between 1 and 10, got {}",
                self.lock_retries
            )));
        }
        if !(1..=5000).contains(&self.lock_backoff_ms) {
            return Err(ConfigError::Invalid(format!(
                "lock_backoff_ms must be between 1 and 5000, got {}",
                self.lock_backoff_ms
            )));
        }
        if !(8..=1000).contains(&self.summary_width) {
            return Err(ConfigError::Invalid(format!(
                "summary_width must be between 8 and 1000, got {}",
                self.summary_width
            )));
        }
        if self.branch_prefix.is_empty() {
            return Err(ConfigError::Invalid("branch_prefix must not be empty".to_string()));
        }
        // A prefix followed by any valid lineage name must still be a valid branch
        if let Err(e) = LineageId::new(format!("{}x", self.branch_prefix)) {
            return Err(ConfigError::Invalid(format!("branch_prefix: {e}")));
        }
        if let Err(e) = LineageId::new(self.root_branch.as_str()) {
            return Err(ConfigError::Invalid(format!("root_branch: {e}")));
        }
        if self.root_branch.starts_with(&self.branch_prefix) {
            return Err(ConfigError::Invalid(format!(
                "root_branch '{}' must not start with branch_prefix '{}'",
                self.root_branch, self.branch_prefix
            )));
        }
        if self.author_name.trim().is_empty() || self.author_email.trim().is_empty() {
            return Err(ConfigError::Invalid("author_name and author_email must be set".to_string()));
        }
        Ok(())
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            root_branch: self.root_branch.clone(),
            author_name: self.author_name.clone(),
            author_email: self.author_email.clone(),
            lock_retries: self.lock_retries,
            lock_backoff_ms: self.lock_backoff_ms,
        }
    }
}
