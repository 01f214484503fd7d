//! Repository lifecycle: probe, initialize, self-heal
//!
//! ```text
//! Uninitialized --init--> Valid
//! Valid --probe fails--> Corrupted --wipe+init--> Valid
//! ```
//!
//! Corruption never reaches callers; the directory is discarded and a fresh
//! repository with a single root commit takes its place.

use crate::error::{BackendError, Result};
use crate::repo::BackendSettings;
use git2::{Repository, RepositoryInitOptions};
use std::path::Path;

/// Contents of the placeholder file in the root commit
pub const ROOT_README: &str = "# GitCheckpoint Conversations\n";

/// Message of the root commit every lineage branches from
pub const ROOT_MESSAGE: &str = gcp_core::message::ROOT_MESSAGE;

/// Observed state of a repository directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    /// Path does not exist or is not a repository yet
    Uninitialized,
    /// Opens, HEAD and the root branch resolve to commits
    Valid,
    /// Exists but fails to open or lacks a resolvable root
    Corrupted,
}

/// Classify the directory at `path`
pub fn probe(path: &Path, settings: &BackendSettings) -> RepoState {
    if !path.exists() {
        return RepoState::Uninitialized;
    }
    if !path.join(".git").exists() {
        let empty = std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            return RepoState::Uninitialized;
        }
    }

    let repo = match Repository::open(path) {
        Ok(repo) => repo,
        Err(_) => return RepoState::Corrupted,
    };
    if repo.is_bare() {
        return RepoState::Corrupted;
    }
    if repo.head().and_then(|head| head.peel_to_commit()).is_err() {
        return RepoState::Corrupted;
    }
    let root = format!("refs/heads/{}", settings.root_branch);
    let state = match repo.revparse_single(&root).and_then(|obj| obj.peel_to_commit()) {
        Ok(_) => RepoState::Valid,
        Err(_) => RepoState::Corrupted,
    };
    state
}

/// Bring the directory at `path` to the Valid state and open it
pub(crate) fn ensure_repository(path: &Path, settings: &BackendSettings) -> Result<Repository> {
    match probe(path, settings) {
        RepoState::Valid => Ok(Repository::open(path)?),
        RepoState::Uninitialized => init_fresh(path, settings),
        RepoState::Corrupted => {
            tracing::warn!(path = %path.display(), "Repository corrupted, reinitializing");
            std::fs::remove_dir_all(path)?;
            init_fresh(path, settings)
        }
    }
}

/// Create a repository whose root branch holds one placeholder commit
fn init_fresh(path: &Path, settings: &BackendSettings) -> Result<Repository> {
    std::fs::create_dir_all(path)?;

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(&settings.root_branch);
    let repo = Repository::init_opts(path, &opts)
        .map_err(|e| BackendError::Init(path.to_path_buf(), e))?;

    std::fs::write(path.join("README.md"), ROOT_README)?;
    {
        let mut index = repo.index()?;
        index.add_path(Path::new("README.md"))?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let sig = git2::Signature::now(&settings.author_name, &settings.author_email)?;
        repo.commit(Some("HEAD"), &sig, &sig, ROOT_MESSAGE, &tree, &[])?;
    }

    tracing::info!(path = %path.display(), root = %settings.root_branch, "Initialized checkpoint repository");
    Ok(repo)
}
