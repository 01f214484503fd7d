//! CLI command execution helpers with automatic timing
//!
//! Wraps the `gcp` binary, pointing it at a repository inside the test's
//! scratch directory, and provides assertion helpers.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct GcpCommand {
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl GcpCommand {
    /// Create a command whose repository lives in `working_dir/.conversations`
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        let working_dir = working_dir.as_ref().to_path_buf();
        let mut env = HashMap::new();
        env.insert(
            "GITCHECKPOINT_DIR".to_string(),
            working_dir.join(".conversations").display().to_string(),
        );
        Self {
            working_dir,
            args: Vec::new(),
            env,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    #[allow(dead_code)]
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(env!("CARGO_BIN_EXE_gcp"))
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env_remove("GITCHECKPOINT_CONFIG")
            .envs(&self.env)
            .output()
            .context("Failed to execute gcp")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// First full checkpoint ID (40 hex chars) in stdout
    pub fn parse_checkpoint_id(&self) -> Option<String> {
        self.stdout.lines().find_map(extract_checkpoint_id)
    }
}

/// Extract a 40-character hex checkpoint ID from a line of text
pub fn extract_checkpoint_id(line: &str) -> Option<String> {
    let bytes = line.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_hexdigit() {
            start += 1;
            continue;
        }
        let end = bytes[start..]
            .iter()
            .position(|b| !b.is_ascii_hexdigit())
            .map_or(bytes.len(), |len| start + len);
        if end - start == 40 {
            return Some(line[start..end].to_string());
        }
        start = end;
    }
    None
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// gcp!(dir, "write", "t1", "--state", "{}").assert_success()?;
/// ```
#[macro_export]
macro_rules! gcp {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::GcpCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_id_extraction() {
        let id = "0123456789abcdef0123456789abcdef01234567";
        let line = format!("Wrote checkpoint {} to t1 (step 0)", id);
        assert_eq!(extract_checkpoint_id(&line), Some(id.to_string()));
    }

    #[test]
    fn test_checkpoint_id_ignores_short_hex() {
        assert_eq!(extract_checkpoint_id("Merge commit: abc1234"), None);
        assert_eq!(extract_checkpoint_id(&"a".repeat(41)), None);
    }
}
