//! Shell command execution.
//!
//! Rendered commands are handed to the platform shell (`sh -c` on Unix,
//! `cmd /C` on Windows) with stdout and stderr captured.  The [`Executor`]
//! trait lets pipeline code be tested without spawning processes.
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output (lossily decoded).
    pub stdout: String,
    /// Captured standard error (lossily decoded).
    pub stderr: String,
    /// Whether the command exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Runs rendered command lines.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    /// Run `command` through the shell and wait for it to finish.
    ///
    /// A non-zero exit is reported through [`ExecResult::success`], not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the shell itself cannot be spawned.
    fn run_shell(&self, command: &str) -> std::io::Result<ExecResult>;
}

/// Production [`Executor`] that spawns the platform shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_shell(&self, command: &str) -> std::io::Result<ExecResult> {
        shell_command(command).output().map(ExecResult::from)
    }
}

/// Build the platform shell invocation for `command`.
fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}
