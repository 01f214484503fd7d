//! Fork, merge, diff and delete workflows

use crate::gcp;
use anyhow::Result;
use tempfile::TempDir;

fn write(dir: &std::path::Path, lineage: &str, state: &str) -> Result<String> {
    let result = gcp!(dir, "write", lineage, "--state", state).assert_success()?;
    Ok(result.parse_checkpoint_id().expect("checkpoint id in output"))
}

fn show_state(dir: &std::path::Path, lineage: &str) -> Result<serde_json::Value> {
    let shown = gcp!(dir, "show", lineage, "--json").assert_success()?;
    let checkpoint: serde_json::Value = serde_json::from_str(&shown.stdout)?;
    Ok(checkpoint["state"].clone())
}

#[test]
fn test_fork_from_history() -> Result<()> {
    let temp = TempDir::new()?;
    let first = write(temp.path(), "main-thread", r#"{"count": 1}"#)?;
    write(temp.path(), "main-thread", r#"{"count": 2}"#)?;

    let forked = gcp!(temp.path(), "fork", "main-thread", &first[..10], "alt").assert_success()?;
    assert!(forked.contains_stdout("Forked"));
    assert_eq!(show_state(temp.path(), "alt")?, serde_json::json!({"count": 1}));

    // Name already taken
    let again = gcp!(temp.path(), "fork", "main-thread", &first, "alt").assert_failure()?;
    assert!(again.contains_stderr("already exists"));
    Ok(())
}

#[test]
fn test_merge_strategies() -> Result<()> {
    let temp = TempDir::new()?;
    write(temp.path(), "a", r#"{"who": "a"}"#)?;
    write(temp.path(), "b", r#"{"who": "b"}"#)?;
    write(temp.path(), "c", r#"{"who": "c"}"#)?;

    let ours = gcp!(temp.path(), "merge", "a", "b").assert_success()?;
    assert!(ours.contains_stdout("Merged 'a' into 'b' using strategy 'ours'"));
    assert_eq!(show_state(temp.path(), "b")?, serde_json::json!({"who": "b"}));

    let theirs = gcp!(temp.path(), "merge", "a", "c", "--strategy", "theirs").assert_success()?;
    assert!(theirs.contains_stdout("using strategy 'theirs'"));
    assert_eq!(show_state(temp.path(), "c")?, serde_json::json!({"who": "a"}));

    let missing = gcp!(temp.path(), "merge", "a", "ghost").assert_failure()?;
    assert!(missing.contains_stderr("not found"));

    gcp!(temp.path(), "merge", "a", "b", "--strategy", "sideways").assert_failure()?;
    Ok(())
}

#[test]
fn test_diff_reports_appended_message() -> Result<()> {
    let temp = TempDir::new()?;
    let a = write(temp.path(), "t1", r#"{"messages": ["hello"]}"#)?;
    let b = write(temp.path(), "t1", r#"{"messages": ["hello", "world"]}"#)?;

    let diff = gcp!(temp.path(), "diff", "t1", &a, &b).assert_success()?;
    assert!(diff.contains_stdout("messages: 1 → 2 items (+1)"));
    assert!(diff.contains_stdout("world"));

    let same = gcp!(temp.path(), "diff", "t1", &a, &a).assert_success()?;
    assert!(same.contains_stdout("(no differences)"));

    let patch = gcp!(temp.path(), "diff", "t1", &a, &b, "-p").assert_success()?;
    assert!(patch.contains_stdout("@@"));
    Ok(())
}

#[test]
fn test_lineages_and_delete() -> Result<()> {
    let temp = TempDir::new()?;
    write(temp.path(), "alpha", r#"{"n": 1}"#)?;
    write(temp.path(), "beta", r#"{"n": 1}"#)?;

    let listed = gcp!(temp.path(), "lineages").assert_success()?;
    let alpha = listed.stdout.find("alpha").expect("alpha listed");
    let beta = listed.stdout.find("beta").expect("beta listed");
    assert!(alpha < beta);

    let deleted = gcp!(temp.path(), "delete", "beta").assert_success()?;
    assert!(deleted.contains_stdout("Deleted lineage 'beta'"));

    let listed = gcp!(temp.path(), "lineages").assert_success()?;
    assert!(!listed.contains_stdout("beta"));

    // Deleting again is a no-op
    let again = gcp!(temp.path(), "delete", "beta").assert_success()?;
    assert!(again.contains_stdout("does not exist"));

    let all = gcp!(temp.path(), "log", "all").assert_success()?;
    assert!(all.contains_stdout("alpha"));
    Ok(())
}
