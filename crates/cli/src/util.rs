//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use gcp_core::{CheckpointId, LineageId};
use journal::{CheckpointStore, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Where to find the store, from global flags / environment
#[derive(Debug, Clone, Default)]
pub struct StoreOpts {
    pub repo: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Load configuration and open the checkpoint store
pub fn open_store(opts: &StoreOpts) -> Result<Arc<CheckpointStore>> {
    let config = load_config(opts)?;
    let path = config.repo_path.clone();
    let store = CheckpointStore::open(config)
        .with_context(|| format!("Failed to open checkpoint store at {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Open the checkpoint store for a command that only reads
///
/// A healthy repository is left exactly as found, including lock files held
/// by a writer in another process.
pub fn open_store_read_only(opts: &StoreOpts) -> Result<Arc<CheckpointStore>> {
    let config = load_config(opts)?;
    let path = config.repo_path.clone();
    let store = CheckpointStore::open_read_only(config)
        .with_context(|| format!("Failed to open checkpoint store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn load_config(opts: &StoreOpts) -> Result<StoreConfig> {
    let mut config = match &opts.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(repo) = &opts.repo {
        config.repo_path = repo.clone();
    }
    Ok(config)
}

/// Run a store call on the blocking pool
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Store task failed to complete")?
}

pub fn parse_lineage(name: &str) -> Result<LineageId> {
    LineageId::new(name).with_context(|| format!("Invalid lineage name '{}'", name))
}

/// Resolve a full checkpoint ID or a unique prefix (at least 4 hex chars)
pub fn resolve_checkpoint_ref(store: &CheckpointStore, reference: &str) -> Result<CheckpointId> {
    store
        .resolve_checkpoint(reference)
        .with_context(|| format!("Unknown checkpoint reference: '{}'", reference))
}

/// Format Unix seconds as relative time ("2 hours ago")
pub fn format_relative_time(ts_secs: i64) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();
    let seconds = now - ts_secs;

    if seconds < 0 {
        "in the future".to_string()
    } else if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Format Unix seconds as a UTC timestamp ("2024-01-03 14:30:00")
pub fn format_absolute_time(ts_secs: i64) -> String {
    let (year, month, day) = civil_date(ts_secs.div_euclid(86_400));
    let clock = ts_secs.rem_euclid(86_400);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        clock / 3600,
        clock % 3600 / 60,
        clock % 60
    )
}

/// Gregorian (year, month, day) of a day count relative to 1970-01-01
fn civil_date(days: i64) -> (i64, u32, u32) {
    let mut year = 1970;
    let mut remaining = days;
    while remaining < 0 {
        year -= 1;
        remaining += year_length(year);
    }
    while remaining >= year_length(year) {
        remaining -= year_length(year);
        year += 1;
    }

    let february = if year_length(year) == 366 { 29 } else { 28 };
    let mut month = 1;
    for len in [31, february, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31] {
        if remaining < len {
            break;
        }
        remaining -= len;
        month += 1;
    }
    (year, month, remaining as u32 + 1)
}

fn year_length(year: i64) -> i64 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    if leap {
        366
    } else {
        365
    }
}

/// Cut `text` to `width` characters, marking the cut with "..."
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
