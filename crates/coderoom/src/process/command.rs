//! Command builder for shell invocations

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::shell_quote;

/// Builder for a single `shell -c script` invocation
#[derive(Debug, Clone)]
pub struct ShellCommand {
    /// Shell binary
    shell: PathBuf,
    /// Script passed to `-c`
    script: String,
    /// Working directory of the shell
    working_dir: Option<PathBuf>,
    /// File redirected to stdin (`< file`)
    stdin: Option<PathBuf>,
    /// Extra environment variables
    env: HashMap<String, String>,
    /// Wall clock bound
    timeout: Option<Duration>,
    /// Bound on each captured stream in bytes
    max_output: Option<usize>,
}

impl ShellCommand {
    /// Create a new shell command builder
    pub fn new(shell: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            script: script.into(),
            working_dir: None,
            stdin: None,
            env: HashMap::new(),
            timeout: None,
            max_output: None,
        }
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Redirect a file to stdin.
    ///
    /// Relative paths are resolved against the working directory.
    pub fn stdin(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the wall clock bound (None = wait indefinitely)
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the bound on each captured stream (None = unbounded)
    pub fn max_output(mut self, bytes: Option<usize>) -> Self {
        self.max_output = bytes;
        self
    }

    /// Build the argument vector: shell, `-c`, script with redirection.
    ///
    /// The script is wrapped in a brace group so that the redirect applies to
    /// every command in it.
    pub fn build(&self) -> Vec<String> {
        let script = match self.stdin {
            Some(ref stdin) => format!(
                "{{ {}\n}} < {}",
                self.script,
                shell_quote(&stdin.to_string_lossy())
            ),
            None => self.script.clone(),
        };

        vec![
            self.shell.to_string_lossy().into_owned(),
            "-c".to_string(),
            script,
        ]
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn get_working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn get_stdin(&self) -> Option<&Path> {
        self.stdin.as_deref()
    }

    pub fn get_env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_max_output(&self) -> Option<usize> {
        self.max_output
    }
}
