//! Shell command execution
//!
//! Each lifecycle step runs one shell line and hands the captured output to a
//! classifier. A non-zero exit status is not an error at this layer: it is
//! reported in [`CommandOutput::status`] so callers can whitelist specific codes.

use std::process::Stdio;

use tokio::process::Command;

/// Shell used to run lifecycle commands
pub const SHELL: &str = "/bin/bash";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Failed to start command `{0}`: {1}")]
    Spawn(String, std::io::Error),

    #[error("Failed waiting for command `{0}`: {1}")]
    Wait(String, std::io::Error),
}

/// Captured result of one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status, `None` when the process was killed by a signal
    pub status: Option<i32>,
}

impl CommandOutput {
    /// Output of a command that exited with status 0
    pub fn ok(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::with_status(stdout, stderr, 0)
    }

    pub fn with_status(stdout: impl Into<String>, stderr: impl Into<String>, status: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            status: Some(status),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a shell line to completion
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, line: &str) -> Result<CommandOutput, CommandError>;
}

/// Runs commands through `/bin/bash -c`
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    async fn run(&self, line: &str) -> Result<CommandOutput, CommandError> {
        log::debug!("Running: {}", line);

        let output = Command::new(SHELL)
            .arg("-c")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Spawn(line.to_string(), e))?
            .wait_with_output()
            .await
            .map_err(|e| CommandError::Wait(line.to_string(), e))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        };

        log::debug!(
            "`{}` exited with {:?} (stdout {} bytes, stderr {} bytes)",
            line,
            result.status,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_both_streams() {
        let out = ShellRunner.run("echo out; echo err >&2").await.unwrap();
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert!(out.success());
    }

    #[tokio::test]
    async fn test_reports_exit_status() {
        let out = ShellRunner.run("exit 5").await.unwrap();
        assert_eq!(out.status, Some(5));
        assert!(!out.success());
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_output_constructors() {
        let out = CommandOutput::ok("", "Created symlink x");
        assert_eq!(out.status, Some(0));
        let out = CommandOutput::with_status("", "", 3);
        assert!(!out.success());
    }
}
