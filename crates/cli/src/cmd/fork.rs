//! Fork a lineage at a checkpoint

use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub async fn run(opts: &StoreOpts, source: &str, checkpoint_ref: &str, new_lineage: &str) -> Result<()> {
    let source = util::parse_lineage(source)?;
    let new_lineage = util::parse_lineage(new_lineage)?;
    let store = util::open_store(opts)?;
    let checkpoint_id = util::resolve_checkpoint_ref(&store, checkpoint_ref)?;

    {
        let source = source.clone();
        let new_lineage = new_lineage.clone();
        util::blocking(move || {
            store
                .fork(&source, &checkpoint_id, &new_lineage)
                .with_context(|| format!("Failed to fork '{}'", source))
        })
        .await?;
    }

    println!(
        "{} Forked {} at {} → {}",
        "✓".green(),
        source.as_str().cyan(),
        checkpoint_id.short().yellow(),
        new_lineage.as_str().cyan()
    );
    Ok(())
}
