//! Merge one lineage into another

use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use gcp_core::MergeStrategy;
use owo_colors::OwoColorize;

pub async fn run(opts: &StoreOpts, source: &str, target: &str, strategy: MergeStrategy) -> Result<()> {
    let source = util::parse_lineage(source)?;
    let target = util::parse_lineage(target)?;
    let store = util::open_store(opts)?;

    let merged = {
        let source = source.clone();
        let target = target.clone();
        util::blocking(move || {
            store
                .merge(&source, &target, strategy)
                .with_context(|| format!("Failed to merge '{}' into '{}'", source, target))
        })
        .await?
    };

    println!(
        "{} Merged '{}' into '{}' using strategy '{}'. Merge commit: {}",
        "✓".green(),
        source,
        target,
        strategy,
        merged.short().yellow()
    );
    Ok(())
}
