//! Delete a lineage

use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub async fn run(opts: &StoreOpts, lineage: &str) -> Result<()> {
    let lineage = util::parse_lineage(lineage)?;
    let store = util::open_store(opts)?;

    let deleted = {
        let lineage = lineage.clone();
        util::blocking(move || {
            store
                .delete_lineage(&lineage)
                .with_context(|| format!("Failed to delete lineage '{}'", lineage))
        })
        .await?
    };

    if deleted {
        println!("{} Deleted lineage '{}'", "✓".green(), lineage);
    } else {
        println!("{}", format!("Lineage '{}' does not exist", lineage).dimmed());
    }
    Ok(())
}
