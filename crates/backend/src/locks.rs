//! Stale lock artifacts and lock-contention retry
//!
//! A process that crashes mid-mutation leaves `*.lock` files behind
//! (`index.lock`, `HEAD.lock`, `refs/heads/<branch>.lock`) and git refuses
//! to mutate until they are gone. All mutation in this crate happens under
//! the caller's process-wide lock, so any lock file seen before a mutation
//! starts is stale.

use crate::error::Contended;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;
use walkdir::WalkDir;

/// Remove lock files left in a git directory; returns how many were removed
pub fn clear_stale_locks(git_dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;

    for name in ["index.lock", "HEAD.lock", "config.lock", "packed-refs.lock"] {
        if remove_if_present(&git_dir.join(name))? {
            removed += 1;
        }
    }

    let refs_dir = git_dir.join("refs");
    if refs_dir.is_dir() {
        for entry in WalkDir::new(&refs_dir).into_iter().filter_map(|e| e.ok()) {
            let is_lock = entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(".lock");
            if is_lock && remove_if_present(entry.path())? {
                removed += 1;
            }
        }
    }

    if removed > 0 {
        tracing::warn!(removed, git_dir = %git_dir.display(), "Removed stale lock files");
    }
    Ok(removed)
}

fn remove_if_present(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Backoff before retry number `attempt` (1-based): base, 2*base, 4*base, ...
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(16);
    Duration::from_millis(base_ms.saturating_mul(1u64 << shift))
}

/// Run `op` up to `attempts` times, sleeping with exponential backoff
/// between attempts that failed on lock contention
///
/// `before_attempt` runs ahead of every attempt (lock cleanup).
pub fn retry_on_contention<T, E, S, F>(
    attempts: u32,
    base_backoff_ms: u64,
    mut state: S,
    mut before_attempt: impl FnMut(&mut S) -> Result<(), E>,
    mut op: F,
) -> Result<T, E>
where
    E: Contended + std::fmt::Display,
    F: FnMut(&mut S) -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        before_attempt(&mut state)?;

        match op(&mut state) {
            Err(e) if e.is_lock_contention() && attempt < attempts => {
                let delay = backoff_delay(base_backoff_ms, attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Repository locked, retrying");
                sleep(delay);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct Flaky(bool);

    impl Contended for Flaky {
        fn is_lock_contention(&self) -> bool {
            self.0
        }
    }

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky(locked={})", self.0)
        }
    }

    #[test]
    fn test_clear_stale_locks() {
        let temp_dir = TempDir::new().unwrap();
        let git_dir = temp_dir.path();
        fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
        fs::write(git_dir.join("index.lock"), "").unwrap();
        fs::write(git_dir.join("refs/heads/thread-a.lock"), "").unwrap();
        fs::write(git_dir.join("refs/heads/thread-a"), "0000").unwrap();

        assert_eq!(clear_stale_locks(git_dir).unwrap(), 2);
        assert!(!git_dir.join("index.lock").exists());
        assert!(!git_dir.join("refs/heads/thread-a.lock").exists());
        assert!(git_dir.join("refs/heads/thread-a").exists());

        // Nothing left to remove
        assert_eq!(clear_stale_locks(git_dir).unwrap(), 0);
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(50, 1), Duration::from_millis(50));
        assert_eq!(backoff_delay(50, 2), Duration::from_millis(100));
        assert_eq!(backoff_delay(50, 3), Duration::from_millis(200));
    }

    #[test]
    fn test_retry_until_success() {
        let mut prepared = 0;
        let result: Result<u32, Flaky> = retry_on_contention(
            3,
            1,
            0u32,
            |_| {
                prepared += 1;
                Ok(())
            },
            |calls| {
                *calls += 1;
                if *calls < 3 {
                    Err(Flaky(true))
                } else {
                    Ok(*calls)
                }
            },
        );
        assert_eq!(result.unwrap(), 3);
        assert_eq!(prepared, 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let mut calls = 0;
        let result: Result<(), Flaky> = retry_on_contention(
            2,
            1,
            (),
            |_| Ok(()),
            |_| {
                calls += 1;
                Err(Flaky(true))
            },
        );
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_other_errors_not_retried() {
        let mut calls = 0;
        let result: Result<(), Flaky> = retry_on_contention(
            5,
            1,
            (),
            |_| Ok(()),
            |_| {
                calls += 1;
                Err(Flaky(false))
            },
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
