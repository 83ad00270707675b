//! Command execution for the external packaging tool
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Uses `tokio::process::Command`, never a shell
//! - **Argument safety**: Arguments are passed as a vector, never interpolated
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout control**: A child that outlives the timeout is killed
//!
//! # Example
//!
//! ```rust,no_run
//! use linuxpkg::security::{CommandExecutor, SafeCommandExecutor};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut executor = SafeCommandExecutor::new(".")?;
//! executor.set_timeout(Duration::from_secs(300));
//!
//! let output = executor.run("nfpm", &["--version".to_string()]).await?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist for security.
const ALLOWED_COMMANDS: &[&str] = &["nfpm"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),

    /// Command ran but reported failure
    #[error("{program} exited with {}", exit_label(.code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        output: String,
    },
}

impl CommandError {
    /// Combined output captured before the failure, if any
    pub fn output(&self) -> &str {
        match self {
            Self::NonZeroExit { output, .. } => output,
            _ => "",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

/// Capability to run an external program and collect its combined output
///
/// On success the returned string holds stdout followed by stderr.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError>;
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
    allowed: Vec<String>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
            allowed: ALLOWED_COMMANDS.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration are killed.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Add a program to the whitelist
    #[cfg(test)]
    fn allow_command(&mut self, command: &str) {
        if !self.allowed.iter().any(|c| c == command) {
            self.allowed.push(command.to_string());
        }
    }
}

#[async_trait]
impl CommandExecutor for SafeCommandExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError> {
        if !self.allowed.iter().any(|c| c == program) {
            return Err(CommandError::CommandNotAllowed(program.to_string()));
        }

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let pending = command.output();
        let result = match self.timeout {
            // Dropping the pending future kills the child
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| CommandError::Timeout(limit))?,
            None => pending.await,
        };
        let output = result.map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let combined = stdout + &stderr;

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                program: program.to_string(),
                code: output.status.code(),
                output: combined,
            });
        }

        Ok(combined)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
        let result = executor.run("rm", &args(&["-rf", "/"])).await;
        assert!(
            matches!(result, Err(CommandError::CommandNotAllowed(_))),
            "rm should be rejected as not in whitelist"
        );
    }

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/that/does/not/exist");
        assert!(
            matches!(result, Err(CommandError::InvalidWorkingDirectory(_))),
            "Should reject non-existent working directory"
        );
    }

    #[test]
    fn test_allow_command_is_idempotent() {
        let mut executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
        executor.allow_command("nfpm");
        executor.allow_command("sh");
        executor.allow_command("sh");
        assert_eq!(executor.allowed, vec!["nfpm", "sh"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_execution_failure() {
        let mut executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
        executor.allow_command("linuxpkg-definitely-not-installed");
        let result = executor
            .run("linuxpkg-definitely-not-installed", &[])
            .await;
        assert!(matches!(result, Err(CommandError::ExecutionFailed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_combined_output_and_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "here").unwrap();

        let mut executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        executor.allow_command("sh");
        let output = executor
            .run("sh", &args(&["-c", "cat marker.txt; echo; echo warn 1>&2"]))
            .await
            .unwrap();

        assert_eq!(output, "here\nwarn\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_keeps_output() {
        let mut executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
        executor.allow_command("sh");
        let err = executor
            .run("sh", &args(&["-c", "echo broken config; exit 3"]))
            .await
            .unwrap_err();

        match &err {
            CommandError::NonZeroExit { code, .. } => assert_eq!(*code, Some(3)),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(err.output(), "broken config\n");
        assert_eq!(err.to_string(), "sh exited with exit status 3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_with_timeout() {
        let mut executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
        executor.allow_command("sleep");
        executor.set_timeout(Duration::from_millis(100));

        let result = executor.run("sleep", &args(&["5"])).await;
        assert!(
            matches!(result, Err(CommandError::Timeout(_))),
            "Long-running command should time out"
        );
    }
}
