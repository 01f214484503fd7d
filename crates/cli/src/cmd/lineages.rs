//! List lineages

use crate::util::{self, StoreOpts};
use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn run(opts: &StoreOpts) -> Result<()> {
    let store = util::open_store_read_only(opts)?;
    let lineages = store.list_lineages()?;

    if lineages.is_empty() {
        println!("{}", "No lineages yet".dimmed());
        return Ok(());
    }

    println!("{} ({})", "Lineages".bold(), lineages.len());
    for summary in &lineages {
        let marker = if summary.active { "*" } else { " " };
        println!(
            "{} {} {} {} checkpoints, {} {}",
            marker.green(),
            summary.lineage_id.as_str().cyan(),
            summary.head_checkpoint_id.short().yellow(),
            summary.checkpoint_count,
            util::format_relative_time(summary.updated_at).dimmed(),
            summary.head_summary
        );
    }
    Ok(())
}
