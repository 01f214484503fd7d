//! Serialized checkpoint writes
//!
//! Each write checks out the lineage branch, rewrites the payload files in the
//! working tree and commits. A full-state write resets the pending-writes list
//! to empty; pending-write appends commit only the updated list.

use crate::error::{Result, StoreError};
use crate::reader::{load_checkpoint, parse_pending_records};
use crate::store::CheckpointStore;
use crate::{METADATA_FILE, PENDING_WRITES_FILE, STATE_FILE};
use backend::Backend;
use gcp_core::checkpoint::{LABEL_KEY, NAMESPACE_KEY, SOURCE_KEY, STEP_KEY};
use gcp_core::message::{checkpoint_message, label_message, writes_message};
use gcp_core::{CheckpointId, CheckpointRef, LineageId, Metadata, PendingWriteRecord, State};
use serde_json::Value;

const EMPTY_PENDING: &[u8] = b"[]";

impl CheckpointStore {
    /// Append a checkpoint to `lineage`, creating the lineage on first write
    pub fn write(&self, lineage: &LineageId, state: State, metadata: Metadata) -> Result<CheckpointId> {
        self.commit_checkpoint(lineage, "", &state, metadata)
    }

    /// Like `write`, recording the reference's namespace and returning the
    /// same lineage and namespace with the new id
    pub fn write_in(&self, reference: &CheckpointRef, state: State, metadata: Metadata) -> Result<CheckpointRef> {
        let id = self.commit_checkpoint(&reference.lineage, &reference.namespace, &state, metadata)?;
        Ok(CheckpointRef {
            lineage: reference.lineage.clone(),
            namespace: reference.namespace.clone(),
            checkpoint_id: Some(id),
        })
    }

    #[tracing::instrument(skip_all, fields(lineage = %lineage, namespace = %namespace))]
    fn commit_checkpoint(
        &self,
        lineage: &LineageId,
        namespace: &str,
        state: &State,
        mut metadata: Metadata,
    ) -> Result<CheckpointId> {
        metadata
            .entry(NAMESPACE_KEY)
            .or_insert_with(|| Value::String(namespace.to_string()));

        let state_bytes = serde_json::to_vec_pretty(state)?;
        let metadata_bytes = serde_json::to_vec_pretty(&metadata)?;
        let message = checkpoint_message(&metadata);
        let branch = self.branch_name(lineage);

        let id = self.mutate(|backend| {
            ensure_branch(backend, &branch)?;
            backend.checkout_branch(&branch)?;
            let files = [
                (STATE_FILE, state_bytes.as_slice()),
                (METADATA_FILE, metadata_bytes.as_slice()),
                (PENDING_WRITES_FILE, EMPTY_PENDING),
            ];
            Ok(backend.stage_and_commit(&files, &message)?)
        })?;

        tracing::debug!(checkpoint = %id, message = %message, "Wrote checkpoint");
        Ok(id)
    }

    /// Append pending writes produced by one task against `reference`
    ///
    /// The entries are tagged with the reference's checkpoint id and appended
    /// to the lineage's current list in a single commit that is not itself a
    /// checkpoint. Returns the id of that commit.
    #[tracing::instrument(skip_all, fields(lineage = %reference.lineage, task_id = %task_id))]
    pub fn append_pending_writes(
        &self,
        reference: &CheckpointRef,
        task_id: &str,
        task_path: &str,
        writes: &[(String, Value)],
    ) -> Result<CheckpointId> {
        let branch = self.branch_name(&reference.lineage);
        let checkpoint_id = reference.checkpoint_id.map(|id| id.to_hex());
        let message = writes_message(task_id);

        let id = self.mutate(|backend| {
            if !backend.branch_exists(&branch)? {
                return Err(StoreError::LineageNotFound(reference.lineage.to_string()));
            }
            backend.checkout_branch(&branch)?;

            let mut records = match backend.read_worktree_file(PENDING_WRITES_FILE)? {
                Some(bytes) => parse_pending_records(&bytes),
                None => Vec::new(),
            };
            records.extend(writes.iter().map(|(channel, value)| PendingWriteRecord {
                task_id: task_id.to_string(),
                task_path: task_path.to_string(),
                channel: channel.clone(),
                value: value.clone(),
                checkpoint_id: checkpoint_id.clone(),
            }));

            let bytes = serde_json::to_vec_pretty(&records)?;
            Ok(backend.stage_and_commit(&[(PENDING_WRITES_FILE, bytes.as_slice())], &message)?)
        })?;

        tracing::debug!(commit = %id, count = writes.len(), "Appended pending writes");
        Ok(id)
    }

    /// Append a single pending write
    pub fn append_pending_write(
        &self,
        reference: &CheckpointRef,
        task_id: &str,
        channel: &str,
        value: Value,
    ) -> Result<CheckpointId> {
        self.append_pending_writes(reference, task_id, "", &[(channel.to_string(), value)])
    }

    /// Record the head state of `lineage` again as a labelled, manual checkpoint
    pub fn label(&self, lineage: &LineageId, label: &str) -> Result<CheckpointId> {
        let branch = self.branch_name(lineage);
        let message = label_message(label);

        let id = self.mutate(|backend| {
            let Some(head) = backend.branch_head(&branch)? else {
                return Err(StoreError::LineageNotFound(lineage.to_string()));
            };
            let Some(current) = load_checkpoint(backend, lineage, "", head)? else {
                return Err(StoreError::LineageNotFound(lineage.to_string()));
            };

            let mut metadata = Metadata::new();
            metadata.insert(SOURCE_KEY.to_string(), Value::from("manual"));
            metadata.insert(
                STEP_KEY.to_string(),
                current.metadata.get(STEP_KEY).cloned().unwrap_or(Value::from(0)),
            );
            metadata.insert(LABEL_KEY.to_string(), Value::from(label));
            if let Some(ns) = current.metadata.get(NAMESPACE_KEY) {
                metadata.insert(NAMESPACE_KEY.to_string(), ns.clone());
            }

            let state_bytes = serde_json::to_vec_pretty(&current.state)?;
            let metadata_bytes = serde_json::to_vec_pretty(&metadata)?;
            backend.checkout_branch(&branch)?;
            Ok(backend.stage_and_commit(
                &[
                    (STATE_FILE, state_bytes.as_slice()),
                    (METADATA_FILE, metadata_bytes.as_slice()),
                    (PENDING_WRITES_FILE, EMPTY_PENDING),
                ],
                &message,
            )?)
        })?;

        tracing::info!(lineage = %lineage, checkpoint = %id, "Labelled checkpoint");
        Ok(id)
    }
}

/// Create `branch` at the root commit unless it already exists
fn ensure_branch(backend: &mut Backend, branch: &str) -> Result<()> {
    if !backend.branch_exists(branch)? {
        let root = backend.root_commit()?;
        backend.create_branch(branch, &root)?;
        tracing::info!(branch, "Created lineage branch");
    }
    Ok(())
}
