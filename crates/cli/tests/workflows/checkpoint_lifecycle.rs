//! Write, read and history workflows

use crate::gcp;
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_init_creates_repository() -> Result<()> {
    let temp = TempDir::new()?;

    let result = gcp!(temp.path(), "init").assert_success()?;
    assert!(result.contains_stdout("Checkpoint repository ready"));
    assert!(temp.path().join(".conversations/.git").exists());

    // Re-running is harmless
    gcp!(temp.path(), "init").assert_success()?;
    Ok(())
}

#[test]
fn test_write_then_show() -> Result<()> {
    let temp = TempDir::new()?;

    let written = gcp!(temp.path(), "write", "t1", "--state", r#"{"count": 1}"#).assert_success()?;
    let id = written.parse_checkpoint_id().expect("checkpoint id in output");
    assert!(written.contains_stdout("(step 0)"));

    let shown = gcp!(temp.path(), "show", "t1", "--json").assert_success()?;
    let checkpoint: serde_json::Value = serde_json::from_str(&shown.stdout)?;
    assert_eq!(checkpoint["id"], serde_json::json!(id));
    assert_eq!(checkpoint["state"]["count"], serde_json::json!(1));
    assert_eq!(checkpoint["metadata"]["source"], serde_json::json!("input"));

    // Prefix lookup
    let by_prefix = gcp!(temp.path(), "show", "t1", &id[..8]).assert_success()?;
    assert!(by_prefix.contains_stdout(&id));
    Ok(())
}

#[test]
fn test_read_commands_leave_writer_locks_alone() -> Result<()> {
    let temp = TempDir::new()?;

    let id = gcp!(temp.path(), "write", "t1", "--state", r#"{"n": 1}"#)
        .assert_success()?
        .parse_checkpoint_id()
        .expect("checkpoint id");
    let lock = temp.path().join(".conversations/.git/index.lock");
    std::fs::write(&lock, b"")?;

    gcp!(temp.path(), "show", "t1").assert_success()?;
    gcp!(temp.path(), "log", "t1").assert_success()?;
    gcp!(temp.path(), "lineages").assert_success()?;
    gcp!(temp.path(), "diff", "t1", &id, &id).assert_success()?;
    assert!(lock.exists());

    // A writer treats the leftover lock as stale
    gcp!(temp.path(), "write", "t1", "--state", r#"{"n": 2}"#).assert_success()?;
    assert!(!lock.exists());
    Ok(())
}

#[test]
fn test_step_defaults_to_head_plus_one() -> Result<()> {
    let temp = TempDir::new()?;

    gcp!(temp.path(), "write", "t1", "--state", r#"{"n": 1}"#).assert_success()?;
    let second = gcp!(temp.path(), "write", "t1", "--state", r#"{"n": 2}"#).assert_success()?;
    assert!(second.contains_stdout("(step 1)"));

    let explicit = gcp!(temp.path(), "write", "t1", "--state", "{}", "--step", "10").assert_success()?;
    assert!(explicit.contains_stdout("(step 10)"));
    Ok(())
}

#[test]
fn test_log_orders_newest_first_and_filters() -> Result<()> {
    let temp = TempDir::new()?;

    gcp!(temp.path(), "write", "t1", "--state", r#"{"count": 1}"#).assert_success()?;
    let second = gcp!(temp.path(), "write", "t1", "--state", r#"{"count": 2}"#, "--source", "loop")
        .assert_success()?
        .parse_checkpoint_id()
        .expect("checkpoint id");

    let log = gcp!(temp.path(), "log", "t1").assert_success()?;
    let first_pos = log.stdout.find("count: 2").expect("newest entry");
    let second_pos = log.stdout.find("count: 1").expect("older entry");
    assert!(first_pos < second_pos);

    let filtered = gcp!(temp.path(), "log", "t1", "--source", "loop").assert_success()?;
    assert!(filtered.contains_stdout("count: 2"));
    assert!(!filtered.contains_stdout("count: 1"));

    let older = gcp!(temp.path(), "log", "t1", "--before", &second).assert_success()?;
    assert!(older.contains_stdout("count: 1"));
    assert!(!older.contains_stdout("count: 2"));

    let limited = gcp!(temp.path(), "log", "t1", "--limit", "1").assert_success()?;
    assert!(limited.contains_stdout("count: 2"));
    assert!(!limited.contains_stdout("count: 1"));
    Ok(())
}

#[test]
fn test_label_records_manual_checkpoint() -> Result<()> {
    let temp = TempDir::new()?;

    gcp!(temp.path(), "write", "t1", "--state", r#"{"messages": ["hi"]}"#, "--step", "3")
        .assert_success()?;
    gcp!(temp.path(), "label", "t1", "good answer").assert_success()?;

    let shown = gcp!(temp.path(), "show", "t1", "--json").assert_success()?;
    let checkpoint: serde_json::Value = serde_json::from_str(&shown.stdout)?;
    assert_eq!(checkpoint["metadata"]["source"], serde_json::json!("manual"));
    assert_eq!(checkpoint["metadata"]["step"], serde_json::json!(3));
    assert_eq!(checkpoint["metadata"]["label"], serde_json::json!("good answer"));
    assert_eq!(checkpoint["state"]["messages"], serde_json::json!(["hi"]));
    Ok(())
}

#[test]
fn test_show_missing_lineage_fails() -> Result<()> {
    let temp = TempDir::new()?;

    let result = gcp!(temp.path(), "show", "ghost").assert_failure()?;
    assert!(result.contains_stderr("No checkpoints in lineage 'ghost'"));
    Ok(())
}

#[test]
fn test_invalid_state_is_rejected() -> Result<()> {
    let temp = TempDir::new()?;

    let result = gcp!(temp.path(), "write", "t1", "--state", "[1, 2]").assert_failure()?;
    assert!(result.contains_stderr("JSON object"));
    Ok(())
}
