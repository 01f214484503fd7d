//! Lock-free checkpoint reads and history listing
//!
//! A commit is a checkpoint when its tree carries a state payload and it is
//! not a pending-write commit. Pending-write commits hang off the checkpoint
//! they follow: reading one yields that checkpoint with the accumulated
//! pending writes.

use crate::error::Result;
use crate::store::CheckpointStore;
use crate::{METADATA_FILE, PENDING_WRITES_FILE, STATE_FILE};
use backend::{Backend, CommitInfo};
use gcp_core::checkpoint::{metadata_matches, PendingWrite, PendingWriteRecord};
use gcp_core::message::is_writes_message;
use gcp_core::{Checkpoint, CheckpointId, CheckpointRef, LineageId, Metadata, State};

/// Options for `CheckpointStore::list`
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Exact-match conjunction over metadata fields
    pub filter: Option<Metadata>,
    /// Yield only checkpoints after this one in the walk (exclusive)
    pub before: Option<CheckpointId>,
    /// Maximum number of checkpoints yielded
    pub limit: Option<usize>,
    /// Echoed into each yielded checkpoint
    pub namespace: String,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Metadata) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn before(mut self, id: CheckpointId) -> Self {
        self.before = Some(id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl CheckpointStore {
    /// Read the head of `lineage`, or a specific checkpoint when `id` is given
    pub fn read(&self, lineage: &LineageId, id: Option<&CheckpointId>) -> Result<Option<Checkpoint>> {
        let reference = CheckpointRef {
            lineage: lineage.clone(),
            namespace: String::new(),
            checkpoint_id: id.copied(),
        };
        self.read_ref(&reference)
    }

    /// Read the checkpoint a reference addresses; absent when the lineage
    /// does not exist or the id resolves to no checkpoint
    pub fn read_ref(&self, reference: &CheckpointRef) -> Result<Option<Checkpoint>> {
        let backend = self.reader()?;
        let Some(head) = backend.branch_head(&self.branch_name(&reference.lineage))? else {
            return Ok(None);
        };

        let start = match reference.checkpoint_id {
            Some(id) if backend.commit_exists(&id)? => id,
            Some(_) => return Ok(None),
            None => head,
        };

        load_checkpoint(&backend, &reference.lineage, &reference.namespace, start)
    }

    /// Walk `lineage` from its head, newest first
    ///
    /// Commit ids are ordered up front (a topological sort needs the whole
    /// graph); checkpoints are loaded and filtered one at a time as the
    /// iterator advances. A missing lineage yields nothing. Each call starts a
    /// new walk from the head as it is now.
    pub fn list(&self, lineage: &LineageId, query: ListQuery) -> Result<CheckpointIter> {
        let backend = self.reader()?;
        let ids = match backend.branch_head(&self.branch_name(lineage))? {
            Some(head) => backend.history(&head)?,
            None => Vec::new(),
        };

        Ok(CheckpointIter {
            backend,
            lineage: lineage.clone(),
            ids: ids.into_iter(),
            seen_before: query.before.is_none(),
            query,
            yielded: 0,
            done: false,
        })
    }
}

/// Lazy sequence of checkpoints produced by `CheckpointStore::list`
pub struct CheckpointIter {
    backend: Backend,
    lineage: LineageId,
    ids: std::vec::IntoIter<CheckpointId>,
    query: ListQuery,
    seen_before: bool,
    yielded: usize,
    done: bool,
}

impl CheckpointIter {
    fn next_checkpoint(&mut self) -> Result<Option<Checkpoint>> {
        while let Some(id) = self.ids.next() {
            if !self.seen_before {
                self.seen_before = self.query.before == Some(id);
                continue;
            }

            let info = self.backend.commit_info(&id)?;
            if !is_checkpoint(&self.backend, &info)? {
                continue;
            }
            let checkpoint = checkpoint_at(&self.backend, &self.lineage, &self.query.namespace, &info, id)?;
            let Some(checkpoint) = checkpoint else {
                continue;
            };

            let matches = self
                .query
                .filter
                .as_ref()
                .map_or(true, |filter| metadata_matches(&checkpoint.metadata, filter));
            if matches {
                return Ok(Some(checkpoint));
            }
        }
        Ok(None)
    }
}

impl Iterator for CheckpointIter {
    type Item = Result<Checkpoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.query.limit.is_some_and(|limit| self.yielded >= limit) {
            return None;
        }

        match self.next_checkpoint() {
            Ok(Some(checkpoint)) => {
                self.yielded += 1;
                Some(Ok(checkpoint))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Whether a commit is a checkpoint (has state, is not a pending-write commit)
pub(crate) fn is_checkpoint(backend: &Backend, info: &CommitInfo) -> Result<bool> {
    Ok(!is_writes_message(&info.message) && backend.has_file(&info.id, STATE_FILE)?)
}

/// Nearest checkpoint at or below `start` along first parents, passing
/// through pending-write commits only
pub(crate) fn nearest_checkpoint(backend: &Backend, start: CheckpointId) -> Result<Option<CommitInfo>> {
    let mut current = start;
    loop {
        let info = backend.commit_info(&current)?;
        if !is_writes_message(&info.message) {
            return Ok(is_checkpoint(backend, &info)?.then_some(info));
        }
        match info.parents.first() {
            Some(parent) => current = *parent,
            None => return Ok(None),
        }
    }
}

/// Load the checkpoint that commit `start` represents
///
/// Pending writes come from `start` itself; everything else from the nearest
/// checkpoint at or below it.
pub(crate) fn load_checkpoint(
    backend: &Backend,
    lineage: &LineageId,
    namespace: &str,
    start: CheckpointId,
) -> Result<Option<Checkpoint>> {
    let Some(info) = nearest_checkpoint(backend, start)? else {
        return Ok(None);
    };
    checkpoint_at(backend, lineage, namespace, &info, start)
}

fn checkpoint_at(
    backend: &Backend,
    lineage: &LineageId,
    namespace: &str,
    info: &CommitInfo,
    pending_from: CheckpointId,
) -> Result<Option<Checkpoint>> {
    let Some(state_bytes) = backend.read_file(&info.id, STATE_FILE)? else {
        return Ok(None);
    };
    let state: State = serde_json::from_slice(&state_bytes)?;

    let metadata: Metadata = match backend.read_file(&info.id, METADATA_FILE)? {
        Some(bytes) => serde_json::from_slice(&bytes)?,
        None => Metadata::new(),
    };

    let pending_writes = read_pending_records(backend, &pending_from)?
        .into_iter()
        .map(PendingWrite::from)
        .collect();

    let parent_id = match info.parents.first() {
        Some(parent) => nearest_checkpoint(backend, *parent)?.map(|parent| parent.id),
        None => None,
    };

    Ok(Some(Checkpoint {
        id: info.id,
        lineage: lineage.clone(),
        namespace: namespace.to_string(),
        state,
        metadata,
        pending_writes,
        parent_id,
        created_at: info.time,
    }))
}

/// Stored pending-write records at a commit; unreadable lists count as empty
pub(crate) fn read_pending_records(backend: &Backend, id: &CheckpointId) -> Result<Vec<PendingWriteRecord>> {
    let Some(bytes) = backend.read_file(id, PENDING_WRITES_FILE)? else {
        return Ok(Vec::new());
    };
    Ok(parse_pending_records(&bytes))
}

pub(crate) fn parse_pending_records(bytes: &[u8]) -> Vec<PendingWriteRecord> {
    match serde_json::from_slice(bytes) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unparsable pending writes");
            Vec::new()
        }
    }
}
