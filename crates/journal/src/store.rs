//! Process-wide checkpoint store handle
//!
//! Every mutation (write, pending-write append, label, fork, merge, delete)
//! runs while holding `backend`, because the repository has a single working
//! tree, index and active branch. Reads open their own repository handle and
//! only address commits by explicit id or branch name, so they never wait on
//! the lock; a read racing a write may see either head.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::reader::is_checkpoint;
use backend::{lifecycle, Backend, BackendError, RepoState};
use gcp_core::id::validate_prefix;
use gcp_core::message::subject;
use gcp_core::{CheckpointId, LineageId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Width of `LineageSummary::head_summary`
pub const HEAD_SUMMARY_WIDTH: usize = 60;

/// Overview of one lineage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageSummary {
    pub lineage_id: LineageId,
    pub head_checkpoint_id: CheckpointId,
    /// First line of the head commit message
    pub head_summary: String,
    /// Checkpoints reachable from the head (pending-write commits excluded)
    pub checkpoint_count: usize,
    /// Head commit time (Unix seconds)
    pub updated_at: i64,
    /// Whether this lineage is the backend's active branch
    pub active: bool,
}

pub struct CheckpointStore {
    config: StoreConfig,
    path: PathBuf,
    backend: Mutex<Backend>,
}

impl CheckpointStore {
    /// Open the store at `config.repo_path`, creating or repairing the
    /// repository as needed
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let backend = Backend::open_or_init(&config.repo_path, config.backend_settings())?;
        let path = backend.path().to_path_buf();
        tracing::debug!(path = %path.display(), "Opened checkpoint store");
        Ok(Self {
            config,
            path,
            backend: Mutex::new(backend),
        })
    }

    /// Open the store for reading without touching a healthy repository
    ///
    /// Lock files of a concurrent writer are left in place. Only a missing or
    /// corrupted repository falls back to the repairing `open`.
    pub fn open_read_only(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let settings = config.backend_settings();
        if lifecycle::probe(&config.repo_path, &settings) != RepoState::Valid {
            return Self::open(config);
        }

        let backend = Backend::open_reader(&config.repo_path, settings)?;
        let path = backend.path().to_path_buf();
        tracing::debug!(path = %path.display(), "Opened checkpoint store read-only");
        Ok(Self {
            config,
            path,
            backend: Mutex::new(backend),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Working tree root of the repository
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Branch name backing `lineage`
    pub fn branch_name(&self, lineage: &LineageId) -> String {
        format!("{}{}", self.config.branch_prefix, lineage)
    }

    /// Lineage a branch belongs to, if it is a lineage branch
    pub(crate) fn lineage_of(&self, branch: &str) -> Option<LineageId> {
        let name = branch.strip_prefix(&self.config.branch_prefix)?;
        LineageId::new(name).ok()
    }

    /// Run `op` under the process-wide mutation lock with stale-lock cleanup
    /// and bounded retry on lock contention
    pub(crate) fn mutate<T>(&self, op: impl FnMut(&mut Backend) -> Result<T>) -> Result<T> {
        let mut backend = self.backend.lock();
        backend.with_lock_retry(op)
    }

    /// Fresh repository handle for lock-free reads
    pub(crate) fn reader(&self) -> Result<Backend> {
        Ok(Backend::open_reader(
            &self.path,
            self.config.backend_settings(),
        )?)
    }

    /// All lineages, sorted by lineage id
    pub fn list_lineages(&self) -> Result<Vec<LineageSummary>> {
        let backend = self.reader()?;
        let current = backend.current_branch()?;

        let mut summaries = Vec::new();
        for (branch, head) in backend.branches_with_prefix(&self.config.branch_prefix)? {
            let Some(lineage_id) = self.lineage_of(&branch) else {
                tracing::debug!(branch = %branch, "Skipping branch with invalid lineage name");
                continue;
            };

            let info = backend.commit_info(&head)?;
            let mut checkpoint_count = 0;
            for id in backend.history(&head)? {
                if is_checkpoint(&backend, &backend.commit_info(&id)?)? {
                    checkpoint_count += 1;
                }
            }

            summaries.push(LineageSummary {
                lineage_id,
                head_checkpoint_id: head,
                head_summary: subject(&info.message, HEAD_SUMMARY_WIDTH),
                checkpoint_count,
                updated_at: info.time,
                active: current.as_deref() == Some(branch.as_str()),
            });
        }

        summaries.sort_by(|a, b| a.lineage_id.cmp(&b.lineage_id));
        Ok(summaries)
    }

    /// Expand a hex prefix (4-40 characters) to a full checkpoint id
    pub fn resolve_checkpoint(&self, prefix: &str) -> Result<CheckpointId> {
        validate_prefix(prefix)?;
        let backend = self.reader()?;

        if let Ok(id) = CheckpointId::from_hex(prefix) {
            return if backend.commit_exists(&id)? {
                Ok(id)
            } else {
                Err(StoreError::CheckpointNotFound(prefix.to_string()))
            };
        }

        match backend.resolve_prefix(prefix) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(StoreError::CheckpointNotFound(prefix.to_string())),
            Err(BackendError::AmbiguousPrefix(p)) => Err(StoreError::AmbiguousCheckpointId(p)),
            Err(e) => Err(e.into()),
        }
    }
}
