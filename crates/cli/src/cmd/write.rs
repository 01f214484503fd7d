//! Write a checkpoint

use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use gcp_core::{CheckpointRef, Metadata, State};
use owo_colors::OwoColorize;
use serde_json::Value;

pub async fn run(
    opts: &StoreOpts,
    lineage: &str,
    state_json: &str,
    source: &str,
    step: Option<i64>,
    namespace: &str,
) -> Result<()> {
    let lineage = util::parse_lineage(lineage)?;
    let state = parse_state(state_json)?;
    let store = util::open_store(opts)?;

    let step = match step {
        Some(step) => step,
        None => next_step(&store, &lineage)?,
    };

    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), Value::from(source));
    metadata.insert("step".to_string(), Value::from(step));

    let reference = CheckpointRef::latest(lineage.clone()).with_namespace(namespace);
    let written = {
        let store = store.clone();
        util::blocking(move || {
            store
                .write_in(&reference, state, metadata)
                .context("Failed to write checkpoint")
        })
        .await?
    };
    let id = written
        .checkpoint_id
        .context("Store returned no checkpoint id")?;

    println!(
        "{} Wrote checkpoint {} to {} (step {})",
        "✓".green(),
        id.to_hex().yellow(),
        lineage.as_str().cyan(),
        step
    );
    Ok(())
}

/// The lineage head's step plus one, or 0 for a lineage without checkpoints
fn next_step(store: &journal::CheckpointStore, lineage: &gcp_core::LineageId) -> Result<i64> {
    let head = store.read(lineage, None)?;
    Ok(head.and_then(|c| c.step()).map_or(0, |step| step + 1))
}

fn parse_state(text: &str) -> Result<State> {
    let value: Value = serde_json::from_str(text).context("State must be valid JSON")?;
    match value {
        Value::Object(state) => Ok(state),
        other => anyhow::bail!("State must be a JSON object, got: {}", other),
    }
}
