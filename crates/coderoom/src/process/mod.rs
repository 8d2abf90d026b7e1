//! Shell process runner
//!
//! Runs a single shell command per invocation with a wall clock bound,
//! captures its output and maps native failures into typed results.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use crate::process::command::ShellCommand;
pub use crate::process::run::run;

mod command;
mod run;

/// Errors that occur while running a shell command
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command ran and failed; its captured output is attached
    #[error("{0}")]
    Failed(ProcessFailure),

    #[error("failed to spawn {shell}: {source}")]
    SpawnFailed {
        shell: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Captured output of a command that ran, if any
    pub fn failure(&self) -> Option<&ProcessFailure> {
        match self {
            ProcessError::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Output of a command that exited with status zero
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Output of a command that did not exit cleanly
#[derive(Debug, Clone)]
pub struct ProcessFailure {
    pub stdout: String,
    pub stderr: String,
    pub reason: FailureReason,
    pub elapsed: Duration,
}

/// Why a command is considered failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Exited with a non-zero status code
    Exited(i32),
    /// Terminated by a signal it did not handle
    Signaled(i32),
    /// Killed after exceeding its wall clock limit
    TimedOut(Duration),
    /// Killed after writing more than the given number of bytes to one stream
    OutputLimit(usize),
}

impl FailureReason {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureReason::TimedOut(_))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Exited(code) => write!(f, "Process exited with code {code}"),
            FailureReason::Signaled(signal) => {
                write!(f, "Process terminated by signal {signal}")
            }
            FailureReason::TimedOut(limit) => write!(
                f,
                "Time limit exceeded: process killed after {} ms",
                limit.as_millis()
            ),
            FailureReason::OutputLimit(bytes) => write!(
                f,
                "Output limit exceeded: process wrote more than {bytes} bytes"
            ),
        }
    }
}

impl ProcessFailure {
    /// User-visible description of the failure.
    ///
    /// Plain exits report the captured stderr verbatim; the exit status is
    /// only used when stderr is empty. Timeouts and output limits always
    /// append their own message.
    pub fn message(&self) -> String {
        match self.reason {
            FailureReason::Exited(_) | FailureReason::Signaled(_) if !self.stderr.is_empty() => {
                self.stderr.clone()
            }
            FailureReason::Exited(_) | FailureReason::Signaled(_) => self.reason.to_string(),
            FailureReason::TimedOut(_) | FailureReason::OutputLimit(_) => {
                if self.stderr.is_empty() {
                    self.reason.to_string()
                } else if self.stderr.ends_with('\n') {
                    format!("{}{}", self.stderr, self.reason)
                } else {
                    format!("{}\n{}", self.stderr, self.reason)
                }
            }
        }
    }
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}
