//! Show checkpoint history

use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use gcp_core::{summarize_state, Checkpoint, LineageId, Metadata};
use journal::{CheckpointStore, ListQuery};
use owo_colors::OwoColorize;
use serde_json::Value;

const DEFAULT_LIMIT: usize = 20;
const SUMMARY_WIDTH: usize = 60;

pub async fn run(
    opts: &StoreOpts,
    lineage: &str,
    limit: Option<usize>,
    source: Option<&str>,
    before: Option<&str>,
) -> Result<()> {
    let store = util::open_store_read_only(opts)?;

    let mut query = ListQuery::new().limit(limit.unwrap_or(DEFAULT_LIMIT));
    if let Some(source) = source {
        let mut filter = Metadata::new();
        filter.insert("source".to_string(), Value::from(source));
        query = query.filter(filter);
    }
    if let Some(before) = before {
        query = query.before(util::resolve_checkpoint_ref(&store, before)?);
    }

    if lineage == "all" {
        let lineages = store.list_lineages()?;
        if lineages.is_empty() {
            println!("{}", "No lineages yet".dimmed());
            return Ok(());
        }
        for (idx, summary) in lineages.iter().enumerate() {
            if idx > 0 {
                println!();
            }
            println!("{} {}", "lineage".bold(), summary.lineage_id.as_str().cyan().bold());
            print_history(&store, &summary.lineage_id, query.clone())?;
        }
        return Ok(());
    }

    let lineage = util::parse_lineage(lineage)?;
    print_history(&store, &lineage, query)
}

fn print_history(store: &CheckpointStore, lineage: &LineageId, query: ListQuery) -> Result<()> {
    let mut shown = 0;
    for checkpoint in store.list(lineage, query)? {
        let checkpoint = checkpoint.with_context(|| format!("Failed to read history of '{}'", lineage))?;
        println!("{}", format_entry(&checkpoint));
        shown += 1;
    }

    if shown == 0 {
        println!("  {}", "(no checkpoints)".dimmed());
    }
    Ok(())
}

fn format_entry(checkpoint: &Checkpoint) -> String {
    let step = checkpoint
        .step()
        .map(|step| format!("step {}", step))
        .unwrap_or_else(|| "step -".to_string());
    let mut line = format!(
        "  {} {} {} {} {}",
        checkpoint.id.short().yellow(),
        util::format_relative_time(checkpoint.created_at).dimmed(),
        checkpoint.source().unwrap_or("-").cyan(),
        step,
        util::truncate(&summarize_state(&checkpoint.state, SUMMARY_WIDTH), SUMMARY_WIDTH)
    );
    if let Some(label) = checkpoint.label() {
        line.push_str(&format!(" [{}]", label.bold()));
    }
    line
}
