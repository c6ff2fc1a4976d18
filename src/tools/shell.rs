//! Shell command execution with a wall-clock bound and an advisory
//! denylist.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::{truncate_chars, ToolError, MAX_RESULT_CHARS};

/// Wall-clock bound on a single command, in seconds.
pub const COMMAND_TIMEOUT_SECS: u64 = 60;

/// Advisory filter for obviously destructive commands: recursive root
/// deletion, privilege escalation, shutdown/reboot, raw block-device
/// redirection. Not a security boundary.
const DENYLIST: &[&str] = &[
    "rm -rf /",
    "rm -fr /",
    "sudo",
    "shutdown",
    "reboot",
    "of=/dev/",
    "> /dev/sd",
];

/// Runs command strings under a system shell, cwd pinned to the
/// workspace root.
pub struct ShellExecutor {
    workdir: PathBuf,
    timeout_secs: u64,
}

impl ShellExecutor {
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            timeout_secs: COMMAND_TIMEOUT_SECS,
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Run `command` under `sh -c`. Combined stdout/stderr comes back
    /// trimmed and truncated to [`MAX_RESULT_CHARS`]. Denylisted
    /// commands are rejected before any process spawns; a command that
    /// outlives the timeout is killed at that boundary.
    pub async fn execute(&self, command: &str) -> Result<String, ToolError> {
        if let Some(matched) = DENYLIST.iter().find(|needle| command.contains(*needle)) {
            return Err(ToolError::Blocked((*matched).to_string()));
        }

        tracing::debug!(command, "executing shell command");

        let timeout_secs = self.timeout_secs;
        let command = command.to_string();
        let workdir = self.workdir.clone();

        // Runs as its own task: an interrupted outer turn must not
        // orphan a half-supervised child. The timeout inside the task
        // still bounds the command even if the caller goes away.
        let supervised = tokio::spawn(async move {
            let output = tokio::time::timeout(
                Duration::from_secs(timeout_secs),
                Command::new("sh")
                    .arg("-c")
                    .arg(&command)
                    .current_dir(&workdir)
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .kill_on_drop(true)
                    .output(),
            )
            .await;

            match output {
                Err(_) => Err(ToolError::Timeout(timeout_secs)),
                Ok(Err(source)) => Err(ToolError::Shell(source)),
                Ok(Ok(output)) => Ok(output),
            }
        });

        let output = supervised
            .await
            .map_err(|join_error| ToolError::Shell(std::io::Error::other(join_error)))??;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        let trimmed = combined.trim();
        if trimmed.is_empty() {
            return Ok("(no output)".to_string());
        }

        Ok(truncate_chars(trimmed.to_string(), MAX_RESULT_CHARS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn executor(dir: &TempDir) -> ShellExecutor {
        ShellExecutor::new(dir.path().to_path_buf())
    }

    #[tokio::test]
    async fn captures_combined_output() {
        let dir = TempDir::new().unwrap();
        let result = executor(&dir)
            .execute("echo out; echo err >&2")
            .await
            .unwrap();
        assert_eq!(result, "out\nerr");
    }

    #[tokio::test]
    async fn empty_output_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = executor(&dir).execute("true").await.unwrap();
        assert_eq!(result, "(no output)");
    }

    #[tokio::test]
    async fn runs_in_the_workspace_directory() {
        let dir = TempDir::new().unwrap();
        let result = executor(&dir).execute("pwd").await.unwrap();
        assert_eq!(
            PathBuf::from(result),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn sudo_is_blocked_before_spawning() {
        let dir = TempDir::new().unwrap();
        let err = executor(&dir)
            .execute("sudo touch marker")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Blocked(_)), "got: {err:?}");
        assert!(!dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn recursive_root_deletion_is_blocked() {
        let dir = TempDir::new().unwrap();
        let err = executor(&dir).execute("rm -rf / --no-preserve-root").await.unwrap_err();
        assert!(matches!(err, ToolError::Blocked(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn timeout_classifies_instead_of_hanging() {
        let dir = TempDir::new().unwrap();
        let err = executor(&dir)
            .with_timeout(1)
            .execute("sleep 120")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(1)), "got: {err:?}");
    }

    #[tokio::test]
    async fn nonzero_exit_still_returns_output() {
        let dir = TempDir::new().unwrap();
        let result = executor(&dir)
            .execute("echo failing; exit 3")
            .await
            .unwrap();
        assert_eq!(result, "failing");
    }
}
