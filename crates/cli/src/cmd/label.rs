//! Label the lineage head

use crate::util::{self, StoreOpts};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub async fn run(opts: &StoreOpts, lineage: &str, text: &str) -> Result<()> {
    let lineage = util::parse_lineage(lineage)?;
    let store = util::open_store(opts)?;

    let id = {
        let lineage = lineage.clone();
        let text = text.to_string();
        util::blocking(move || {
            store
                .label(&lineage, &text)
                .with_context(|| format!("Failed to label lineage '{}'", lineage))
        })
        .await?
    };

    println!(
        "{} Labelled {} as {} ({})",
        "✓".green(),
        lineage.as_str().cyan(),
        text.bold(),
        id.to_hex().yellow()
    );
    Ok(())
}
