//! Show checkpoint details

use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use gcp_core::summarize_state;
use owo_colors::OwoColorize;

pub async fn run(opts: &StoreOpts, lineage: &str, checkpoint_ref: Option<&str>, json: bool) -> Result<()> {
    let lineage = util::parse_lineage(lineage)?;
    let store = util::open_store_read_only(opts)?;

    let checkpoint_id = checkpoint_ref
        .map(|reference| util::resolve_checkpoint_ref(&store, reference))
        .transpose()?;

    let checkpoint = store
        .read(&lineage, checkpoint_id.as_ref())?
        .with_context(|| match checkpoint_ref {
            Some(reference) => format!("Checkpoint not found: {}", reference),
            None => format!("No checkpoints in lineage '{}'", lineage),
        })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&checkpoint)?);
        return Ok(());
    }

    println!("{} {}", "checkpoint".yellow().bold(), checkpoint.id.to_hex().cyan());
    println!("{} {}", "Lineage:   ".dimmed(), checkpoint.lineage);
    match checkpoint.parent_id {
        Some(parent) => println!("{} {}", "Parent:    ".dimmed(), parent.to_hex().cyan()),
        None => println!("{} {}", "Parent:    ".dimmed(), "(none - first checkpoint)".dimmed()),
    }
    println!(
        "{} {} ({})",
        "Date:      ".dimmed(),
        util::format_absolute_time(checkpoint.created_at),
        util::format_relative_time(checkpoint.created_at).dimmed()
    );
    println!("{} {}", "Source:    ".dimmed(), checkpoint.source().unwrap_or("-"));
    match checkpoint.step() {
        Some(step) => println!("{} {}", "Step:      ".dimmed(), step),
        None => println!("{} -", "Step:      ".dimmed()),
    }
    if let Some(label) = checkpoint.label() {
        println!("{} {}", "Label:     ".dimmed(), label.bold());
    }
    if !checkpoint.namespace.is_empty() {
        println!("{} {}", "Namespace: ".dimmed(), checkpoint.namespace);
    }

    println!("\n{}", "Summary:".bold());
    println!("  {}", summarize_state(&checkpoint.state, store.config().summary_width));

    println!("\n{}", "State:".bold());
    for line in serde_json::to_string_pretty(&checkpoint.state)?.lines() {
        println!("  {}", line);
    }

    if !checkpoint.pending_writes.is_empty() {
        println!("\n{} ({})", "Pending writes:".bold(), checkpoint.pending_writes.len());
        for write in &checkpoint.pending_writes {
            println!("  {} {} = {}", write.task_id.dimmed(), write.channel.cyan(), write.value);
        }
    }

    Ok(())
}
