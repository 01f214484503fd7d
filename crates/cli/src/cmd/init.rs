//! Create or repair the checkpoint repository

use crate::util::{self, StoreOpts};
use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn run(opts: &StoreOpts) -> Result<()> {
    let opts = opts.clone();
    let store = util::blocking(move || util::open_store(&opts)).await?;

    println!("{} Checkpoint repository ready at {}", "✓".green(), store.path().display());
    println!();
    println!("Next steps:");
    println!("  - Run 'gcp write <lineage> --state '{{...}}'' to record a checkpoint");
    println!("  - Run 'gcp lineages' to list lineages");
    Ok(())
}
