//! GitCheckpoint CLI - gcp command

use anyhow::Result;
use clap::{Parser, Subcommand};
use gcp_core::MergeStrategy;
use std::path::PathBuf;
use tracing::Level;

mod cmd;
mod diff_utils;
mod util;

/// GitCheckpoint - versioned conversation state on a git commit graph
#[derive(Parser)]
#[command(name = "gcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Checkpoint repository directory (default: .conversations)
    #[arg(long, global = true, env = "GITCHECKPOINT_DIR")]
    repo: Option<PathBuf>,

    /// Store config file (TOML)
    #[arg(long, global = true, env = "GITCHECKPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or repair) the checkpoint repository
    Init,
    /// Write a checkpoint to a lineage
    Write {
        /// Lineage name
        lineage: String,
        /// State as a JSON object
        #[arg(long)]
        state: String,
        /// Why the checkpoint was produced
        #[arg(long, default_value = "input")]
        source: String,
        /// Step (default: head step + 1, or 0 for a new lineage)
        #[arg(long)]
        step: Option<i64>,
        /// Checkpoint namespace
        #[arg(long, default_value = "")]
        ns: String,
    },
    /// Save the current head state as a labelled checkpoint
    Label {
        /// Lineage name
        lineage: String,
        /// Label text
        text: String,
    },
    /// Show a checkpoint (default: lineage head)
    Show {
        /// Lineage name
        lineage: String,
        /// Checkpoint ID or unique prefix
        checkpoint: Option<String>,
        /// Print the checkpoint as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show checkpoint history of a lineage, or of every lineage with "all"
    Log {
        /// Lineage name or "all"
        lineage: String,
        /// Number of checkpoints to show per lineage (default: 20)
        #[arg(long)]
        limit: Option<usize>,
        /// Only checkpoints with this source
        #[arg(long)]
        source: Option<String>,
        /// Start after this checkpoint ID or prefix
        #[arg(long)]
        before: Option<String>,
    },
    /// List lineages
    Lineages,
    /// Start a new lineage at an existing checkpoint
    Fork {
        /// Lineage the checkpoint was taken from
        source: String,
        /// Checkpoint ID or unique prefix
        checkpoint: String,
        /// Name of the new lineage
        new_lineage: String,
    },
    /// Merge one lineage into another
    Merge {
        /// Lineage to merge from
        source: String,
        /// Lineage to merge into
        target: String,
        /// Conflict strategy: ours keeps the target state, theirs takes the source state
        #[arg(long, default_value = "ours")]
        strategy: MergeStrategy,
    },
    /// Compare the state of two checkpoints
    Diff {
        /// Lineage name
        lineage: String,
        /// First checkpoint ID or prefix
        checkpoint_a: String,
        /// Second checkpoint ID or prefix
        checkpoint_b: String,
        /// Show line-by-line diff of changed channels
        #[arg(short = 'p', long)]
        patch: bool,
        /// Number of context lines (default: 3)
        #[arg(short = 'U', long, default_value = "3")]
        context: usize,
    },
    /// Delete a lineage
    Delete {
        /// Lineage name
        lineage: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let opts = util::StoreOpts {
        repo: cli.repo,
        config: cli.config,
    };

    match cli.command {
        Commands::Init => cmd::init::run(&opts).await,
        Commands::Write { lineage, state, source, step, ns } => {
            cmd::write::run(&opts, &lineage, &state, &source, step, &ns).await
        }
        Commands::Label { lineage, text } => cmd::label::run(&opts, &lineage, &text).await,
        Commands::Show { lineage, checkpoint, json } => {
            cmd::show::run(&opts, &lineage, checkpoint.as_deref(), json).await
        }
        Commands::Log { lineage, limit, source, before } => {
            cmd::log::run(&opts, &lineage, limit, source.as_deref(), before.as_deref()).await
        }
        Commands::Lineages => cmd::lineages::run(&opts).await,
        Commands::Fork { source, checkpoint, new_lineage } => {
            cmd::fork::run(&opts, &source, &checkpoint, &new_lineage).await
        }
        Commands::Merge { source, target, strategy } => {
            cmd::merge::run(&opts, &source, &target, strategy).await
        }
        Commands::Diff { lineage, checkpoint_a, checkpoint_b, patch, context } => {
            cmd::diff::run(&opts, &lineage, &checkpoint_a, &checkpoint_b, patch, context).await
        }
        Commands::Delete { lineage } => cmd::delete::run(&opts, &lineage).await,
    }
}
