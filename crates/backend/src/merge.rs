//! Strategy merges between branches
//!
//! The merge is computed in memory first. If git reports conflicts that the
//! chosen file favor could not settle, the repository is rolled back to the
//! target's pre-merge head and the conflicting paths are returned. Otherwise
//! a two-parent commit is recorded on the target whose tree is exactly one
//! side's tree: the target's for `ours`, the source's for `theirs`.

use crate::error::{BackendError, Result};
use crate::repo::{from_oid, to_oid, Backend};
use gcp_core::{CheckpointId, MergeStrategy};
use git2::build::CheckoutBuilder;
use git2::{FileFavor, MergeOptions, Oid, ResetType};

impl Backend {
    /// Merge branch `source` into branch `target`, leaving `target` checked out
    /// and pointing at the new merge commit
    pub fn merge_branches(
        &mut self,
        source: &str,
        target: &str,
        strategy: MergeStrategy,
        message: &str,
    ) -> Result<CheckpointId> {
        self.checkout_branch(target)?;

        let target_head = self.repo.head()?.peel_to_commit()?.id();
        match self.merge_into_head(source, strategy, message) {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::warn!(source, target, error = %e, "Merge failed, rolling back");
                self.rollback_to(target_head)?;
                Err(e)
            }
        }
    }

    fn merge_into_head(
        &mut self,
        source: &str,
        strategy: MergeStrategy,
        message: &str,
    ) -> Result<CheckpointId> {
        let source_id = self
            .branch_head(source)?
            .ok_or_else(|| git2::Error::from_str(&format!("branch '{source}' not found")))?;
        let theirs = self.repo.find_commit(to_oid(&source_id)?)?;
        let ours = self.repo.head()?.peel_to_commit()?;

        let mut opts = MergeOptions::new();
        opts.file_favor(match strategy {
            MergeStrategy::Ours => FileFavor::Ours,
            MergeStrategy::Theirs => FileFavor::Theirs,
        });

        let merged = self.repo.merge_commits(&ours, &theirs, Some(&opts))?;
        if merged.has_conflicts() {
            let mut paths = Vec::new();
            for conflict in merged.conflicts()? {
                let conflict = conflict?;
                let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
                if let Some(entry) = entry {
                    paths.push(String::from_utf8_lossy(&entry.path).into_owned());
                }
            }
            return Err(BackendError::MergeConflict { paths });
        }

        let tree = match strategy {
            MergeStrategy::Ours => ours.tree()?,
            MergeStrategy::Theirs => theirs.tree()?,
        };

        let sig = self.signature()?;
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&ours, &theirs])?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        self.repo.checkout_head(Some(&mut checkout))?;

        tracing::debug!(source, strategy = %strategy, merge = %oid, "Recorded merge commit");
        from_oid(oid)
    }

    /// Drop any in-progress merge state and hard-reset to `head`
    fn rollback_to(&mut self, head: Oid) -> Result<()> {
        self.repo.cleanup_state()?;
        let commit = self.repo.find_object(head, None)?;
        self.repo.reset(&commit, ResetType::Hard, None)?;
        Ok(())
    }
}
