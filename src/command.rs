//! External command execution used by the address lookup.
//!
//! Lookups shell out to the cloud CLI rather than linking an API client, so
//! this module keeps the process boundary behind a small trait that tests can
//! replace with scripted responses.

use std::ffi::OsString;
use std::process::Command;

use thiserror::Error;

/// Captured exit status and output streams of a finished process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with status zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Exit status for error messages; `unknown` for signal termination.
    #[must_use]
    pub fn status_text(&self) -> String {
        self.code
            .map_or_else(|| String::from("unknown"), |code| code.to_string())
    }

    /// Hands back stdout for a zero exit, or the whole output otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the exit status is non-zero or unknown.
    pub fn into_stdout(self) -> Result<String, Self> {
        if self.is_success() {
            Ok(self.stdout)
        } else {
            Err(self)
        }
    }
}

/// Errors raised when a command cannot be started.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    /// Raised when the program cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
}

/// Process boundary used by CLI-backed lookups; tests swap in scripted
/// runners.
pub trait CommandRunner {
    /// Runs `program` to completion, capturing both output streams.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError>;
}

/// Runner that spawns real processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        tracing::debug!(program, args = args.len(), "spawning command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| CommandError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
