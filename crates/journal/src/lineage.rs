//! Lineage operations: fork, merge, diff, delete

use crate::error::{Result, StoreError};
use crate::reader::load_checkpoint;
use crate::store::CheckpointStore;
use backend::BackendError;
use gcp_core::message::merge_message;
use gcp_core::{diff_states, CheckpointId, CheckpointRef, LineageId, MergeStrategy, StateDiff};

impl CheckpointStore {
    /// Start `new_lineage` at an existing checkpoint
    ///
    /// Only the checkpoint id is checked; `source` names where the caller
    /// found it. No commit is created.
    pub fn fork(
        &self,
        source: &LineageId,
        checkpoint_id: &CheckpointId,
        new_lineage: &LineageId,
    ) -> Result<CheckpointRef> {
        let branch = self.branch_name(new_lineage);

        self.mutate(|backend| {
            if !backend.commit_exists(checkpoint_id)? {
                return Err(StoreError::CheckpointNotFound(checkpoint_id.to_hex()));
            }
            if backend.branch_exists(&branch)? {
                return Err(StoreError::LineageAlreadyExists(new_lineage.to_string()));
            }
            backend.create_branch(&branch, checkpoint_id)?;
            Ok(())
        })?;

        tracing::info!(source = %source, new = %new_lineage, at = %checkpoint_id, "Forked lineage");
        Ok(CheckpointRef::at(new_lineage.clone(), *checkpoint_id))
    }

    /// Merge `source` into `target`, returning the merge commit id
    ///
    /// `Ours` keeps the target's state, `Theirs` takes the source's; either
    /// way the commit has the prior target head and the source head as
    /// parents. A conflicting merge is rolled back before the error returns.
    /// Merging a lineage into itself commits nothing and returns its head.
    #[tracing::instrument(skip_all, fields(source = %source, target = %target))]
    pub fn merge(
        &self,
        source: &LineageId,
        target: &LineageId,
        strategy: MergeStrategy,
    ) -> Result<CheckpointId> {
        let source_branch = self.branch_name(source);
        let target_branch = self.branch_name(target);
        let message = merge_message(source, target, strategy);

        let id = self.mutate(|backend| {
            if !backend.branch_exists(&source_branch)? {
                return Err(StoreError::LineageNotFound(source.to_string()));
            }
            let Some(target_head) = backend.branch_head(&target_branch)? else {
                return Err(StoreError::LineageNotFound(target.to_string()));
            };
            // Already up to date
            if source_branch == target_branch {
                return Ok(target_head);
            }

            backend
                .merge_branches(&source_branch, &target_branch, strategy, &message)
                .map_err(|e| match e {
                    BackendError::MergeConflict { paths } => StoreError::MergeConflict {
                        from_lineage: source.to_string(),
                        into_lineage: target.to_string(),
                        paths,
                    },
                    other => other.into(),
                })
        })?;

        tracing::info!(merge = %id, strategy = %strategy, "Merged lineages");
        Ok(id)
    }

    /// Compare the states of two checkpoints of `lineage`
    pub fn diff(&self, lineage: &LineageId, from: &CheckpointId, to: &CheckpointId) -> Result<StateDiff> {
        let backend = self.reader()?;
        if !backend.branch_exists(&self.branch_name(lineage))? {
            return Err(StoreError::LineageNotFound(lineage.to_string()));
        }

        let load = |id: &CheckpointId| -> Result<_> {
            if !backend.commit_exists(id)? {
                return Err(StoreError::CheckpointNotFound(id.to_hex()));
            }
            load_checkpoint(&backend, lineage, "", *id)?
                .ok_or_else(|| StoreError::CheckpointNotFound(id.to_hex()))
        };
        let old = load(from)?;
        let new = load(to)?;

        Ok(StateDiff {
            from: *from,
            to: *to,
            outcome: diff_states(&old.state, &new.state, self.config().summary_width),
        })
    }

    /// Remove `lineage`; returns false when it did not exist
    pub fn delete_lineage(&self, lineage: &LineageId) -> Result<bool> {
        let branch = self.branch_name(lineage);
        let deleted = self.mutate(|backend| Ok(backend.delete_branch(&branch)?))?;

        if deleted {
            tracing::info!(lineage = %lineage, "Deleted lineage");
        } else {
            tracing::debug!(lineage = %lineage, "Delete of missing lineage ignored");
        }
        Ok(deleted)
    }
}
