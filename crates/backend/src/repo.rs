//! Backend adapter over a non-bare git repository
//!
//! The repository has one working tree, one index and one active branch.
//! Methods taking `&mut self` touch that shared state and must run under the
//! caller's mutation lock; `&self` methods only resolve explicit ids and
//! branch names and are safe on any handle.

use crate::error::{BackendError, Contended, Result};
use crate::lifecycle;
use crate::locks::{clear_stale_locks, retry_on_contention};
use gcp_core::CheckpointId;
use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, Oid, Repository, Signature, Sort};
use std::path::{Path, PathBuf};

/// Settings the backend needs from the store configuration
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Branch holding the placeholder root commit; reserved
    pub root_branch: String,
    pub author_name: String,
    pub author_email: String,
    /// Attempts per mutation when the repository is locked
    pub lock_retries: u32,
    /// Initial backoff, doubled per retry
    pub lock_backoff_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            root_branch: "main".to_string(),
            author_name: "gitcheckpoint".to_string(),
            author_email: "gitcheckpoint@localhost".to_string(),
            lock_retries: 3,
            lock_backoff_ms: 50,
        }
    }
}

/// Commit header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: CheckpointId,
    pub parents: Vec<CheckpointId>,
    pub message: String,
    /// Commit time (Unix seconds)
    pub time: i64,
}

/// Handle to the checkpoint repository
pub struct Backend {
    pub(crate) repo: Repository,
    pub(crate) workdir: PathBuf,
    pub(crate) settings: BackendSettings,
}

impl Backend {
    /// Open the repository at `path`, creating or repairing it as needed
    pub fn open_or_init(path: &Path, settings: BackendSettings) -> Result<Self> {
        let repo = lifecycle::ensure_repository(path, &settings)?;
        let backend = Self::from_repo(repo, settings)?;
        backend.clear_stale_locks()?;
        Ok(backend)
    }

    /// Open an existing repository for reads, without any repair
    pub fn open_reader(path: &Path, settings: BackendSettings) -> Result<Self> {
        let repo = Repository::open(path)?;
        Self::from_repo(repo, settings)
    }

    fn from_repo(repo: Repository, settings: BackendSettings) -> Result<Self> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| BackendError::Bare(repo.path().to_path_buf()))?
            .to_path_buf();
        Ok(Self {
            repo,
            workdir,
            settings,
        })
    }

    /// Working tree root
    pub fn path(&self) -> &Path {
        &self.workdir
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Remove lock files a crashed process left behind
    pub fn clear_stale_locks(&self) -> Result<usize> {
        Ok(clear_stale_locks(self.repo.path())?)
    }

    /// Run a mutation, clearing stale locks before each attempt and retrying
    /// with exponential backoff while the repository reports itself locked
    pub fn with_lock_retry<T, E>(
        &mut self,
        mut op: impl FnMut(&mut Backend) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: Contended + std::fmt::Display + From<BackendError>,
    {
        let attempts = self.settings.lock_retries;
        let backoff = self.settings.lock_backoff_ms;
        retry_on_contention(
            attempts,
            backoff,
            self,
            |backend| backend.clear_stale_locks().map(|_| ()).map_err(E::from),
            |backend| op(&mut **backend),
        )
    }

    // ------------------------------------------------------------------
    // Reads by explicit id / name
    // ------------------------------------------------------------------

    /// Commit the root branch points at
    pub fn root_commit(&self) -> Result<CheckpointId> {
        self.branch_head(&self.settings.root_branch)?
            .ok_or_else(|| BackendError::MissingRoot(self.settings.root_branch.clone()))
    }

    /// Head commit of a local branch, if the branch exists
    pub fn branch_head(&self, name: &str) -> Result<Option<CheckpointId>> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(branch) => {
                let oid = branch.get().peel_to_commit()?.id();
                Ok(Some(from_oid(oid)?))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.branch_head(name)?.is_some())
    }

    /// Local branches whose names start with `prefix`, sorted by name
    pub fn branches_with_prefix(&self, prefix: &str) -> Result<Vec<(String, CheckpointId)>> {
        let mut found = Vec::new();
        for item in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = item?;
            let Some(name) = branch.name()? else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }
            let oid = branch.get().peel_to_commit()?.id();
            found.push((name.to_string(), from_oid(oid)?));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    /// Branch the working tree is on, if HEAD is attached
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(str::to_string))
    }

    /// Whether `id` names a commit in the object database
    pub fn commit_exists(&self, id: &CheckpointId) -> Result<bool> {
        match self.repo.find_commit(to_oid(id)?) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a unique hex prefix to a full commit id
    pub fn resolve_prefix(&self, prefix: &str) -> Result<Option<CheckpointId>> {
        match self.repo.find_commit_by_prefix(prefix) {
            Ok(commit) => Ok(Some(from_oid(commit.id())?)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) if e.code() == ErrorCode::Ambiguous => {
                Err(BackendError::AmbiguousPrefix(prefix.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn commit_info(&self, id: &CheckpointId) -> Result<CommitInfo> {
        let commit = self.repo.find_commit(to_oid(id)?)?;
        let parents = commit
            .parent_ids()
            .map(from_oid)
            .collect::<Result<Vec<_>>>()?;
        Ok(CommitInfo {
            id: *id,
            parents,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            time: commit.time().seconds(),
        })
    }

    /// Contents of `path` in the tree of commit `id`, if present and a blob
    pub fn read_file(&self, id: &CheckpointId, path: &str) -> Result<Option<Vec<u8>>> {
        let tree = self.repo.find_commit(to_oid(id)?)?.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object = entry.to_object(&self.repo)?;
        Ok(object.as_blob().map(|blob| blob.content().to_vec()))
    }

    /// Whether the tree of commit `id` has an entry at `path`
    pub fn has_file(&self, id: &CheckpointId, path: &str) -> Result<bool> {
        let tree = self.repo.find_commit(to_oid(id)?)?.tree()?;
        match tree.get_path(Path::new(path)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All commits reachable from `head`, newest first with children before
    /// parents
    pub fn history(&self, head: &CheckpointId) -> Result<Vec<CheckpointId>> {
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        walk.push(to_oid(head)?)?;
        walk.map(|oid| from_oid(oid?)).collect()
    }

    // ------------------------------------------------------------------
    // Mutations (caller holds the mutation lock)
    // ------------------------------------------------------------------

    /// Create branch `name` pointing at commit `at`
    pub fn create_branch(&mut self, name: &str, at: &CheckpointId) -> Result<()> {
        let commit = self.repo.find_commit(to_oid(at)?)?;
        self.repo.branch(name, &commit, false)?;
        tracing::debug!(branch = name, at = %at, "Created branch");
        Ok(())
    }

    /// Make `name` the active branch with a clean working tree matching it
    pub fn checkout_branch(&mut self, name: &str) -> Result<()> {
        self.clear_stale_locks()?;
        let refname = format!("refs/heads/{name}");
        let target = self.repo.revparse_single(&refname)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        self.repo.checkout_tree(&target, Some(&mut checkout))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    /// Current working-tree contents of `path`, if the file exists
    pub fn read_worktree_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.workdir.join(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `files` into the working tree, stage them and commit on the
    /// active branch with HEAD as the only parent
    pub fn stage_and_commit(&mut self, files: &[(&str, &[u8])], message: &str) -> Result<CheckpointId> {
        for (path, bytes) in files {
            std::fs::write(self.workdir.join(path), bytes)?;
        }

        let mut index = self.repo.index()?;
        for (path, _) in files {
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let parent = self.repo.head()?.peel_to_commit()?;
        let sig = self.signature()?;
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;
        from_oid(oid)
    }

    /// Delete branch `name`, moving off it first when it is active.
    /// Returns false when the branch does not exist.
    pub fn delete_branch(&mut self, name: &str) -> Result<bool> {
        if !self.branch_exists(name)? {
            return Ok(false);
        }

        if self.current_branch()?.as_deref() == Some(name) {
            let fallback = self.fallback_branch(name)?;
            self.checkout_branch(&fallback)?;
        }

        self.clear_stale_locks()?;
        self.repo.find_branch(name, BranchType::Local)?.delete()?;
        Ok(true)
    }

    /// Some branch other than `name` to move to, preferring the root branch
    fn fallback_branch(&self, name: &str) -> Result<String> {
        if name != self.settings.root_branch && self.branch_exists(&self.settings.root_branch)? {
            return Ok(self.settings.root_branch.clone());
        }
        self.branches_with_prefix("")?
            .into_iter()
            .map(|(branch, _)| branch)
            .find(|branch| branch != name)
            .ok_or_else(|| BackendError::MissingRoot(self.settings.root_branch.clone()))
    }

    pub(crate) fn signature(&self) -> Result<Signature<'static>> {
        Ok(Signature::now(
            &self.settings.author_name,
            &self.settings.author_email,
        )?)
    }
}

pub(crate) fn to_oid(id: &CheckpointId) -> Result<Oid> {
    Ok(Oid::from_bytes(id.as_bytes())?)
}

pub(crate) fn from_oid(oid: Oid) -> Result<CheckpointId> {
    let bytes: [u8; 20] = oid
        .as_bytes()
        .try_into()
        .map_err(|_| BackendError::UnsupportedObjectId(oid.to_string()))?;
    Ok(CheckpointId::from_bytes(bytes))
}
