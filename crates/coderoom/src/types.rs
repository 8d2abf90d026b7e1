use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Value of `executionTime` when no timing was taken for a result
pub const EXECUTION_TIME_PLACEHOLDER: &str = "---";

/// A request to compile (where applicable) and run a piece of code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Source text, written to disk verbatim
    pub code: String,

    /// Language identifier (case-insensitive, aliases allowed)
    pub language: String,

    /// Optional text piped to the program's stdin
    #[serde(default)]
    pub input: Option<String>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            input: None,
        }
    }

    /// Attach stdin text to the request
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Input that should actually be fed to the program.
    ///
    /// Whitespace-only input counts as no input at all.
    pub fn effective_input(&self) -> Option<&str> {
        self.input.as_deref().filter(|input| !input.trim().is_empty())
    }
}

/// Uniform result of an execution, regardless of toolchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Program stdout (always empty for document languages)
    pub output: String,

    /// Program stderr, compiler diagnostics or failure description
    pub error: String,

    /// Base64-encoded rendered document, for document languages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_artifact: Option<String>,

    /// Wall time of the compile and run steps, or a placeholder
    pub execution_time: String,
}

impl ExecutionResult {
    /// Result of a program that ran to completion
    pub fn completed(output: String, error: String, elapsed: Duration) -> Self {
        Self {
            output,
            error,
            pdf_artifact: None,
            execution_time: format_elapsed(elapsed),
        }
    }

    /// Result of a document pipeline that produced an artifact
    pub fn document(artifact: String, elapsed: Duration) -> Self {
        Self {
            output: String::new(),
            error: String::new(),
            pdf_artifact: Some(artifact),
            execution_time: format_elapsed(elapsed),
        }
    }

    /// Normalized failure: empty output, the failure text as error
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: error.into(),
            pdf_artifact: None,
            execution_time: EXECUTION_TIME_PLACEHOLDER.to_owned(),
        }
    }

    /// Check if the submitted program failed (compile, run or render)
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.output.is_empty() && self.pdf_artifact.is_none() && !self.error.is_empty()
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}

/// Time and output bounds applied to compile and run steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Wall clock limit for compile steps in seconds (None = uncapped)
    #[serde(default)]
    pub compile_time_limit: Option<f64>,

    /// Wall clock limit for run steps in seconds (None = uncapped)
    #[serde(default)]
    pub run_time_limit: Option<f64>,

    /// Maximum captured size of each output stream in kilobytes
    #[serde(default)]
    pub max_output: Option<u64>,
}

impl Limits {
    /// Create limits with every bound unset
    pub fn unbounded() -> Self {
        Self {
            compile_time_limit: None,
            run_time_limit: None,
            max_output: None,
        }
    }

    pub fn with_compile_time_limit(mut self, seconds: f64) -> Self {
        self.compile_time_limit = Some(seconds);
        self
    }

    pub fn with_run_time_limit(mut self, seconds: f64) -> Self {
        self.run_time_limit = Some(seconds);
        self
    }

    pub fn with_max_output(mut self, kb: u64) -> Self {
        self.max_output = Some(kb);
        self
    }

    /// Apply overrides from another Limits, preferring values from `overrides`
    pub fn with_overrides(&self, overrides: &Limits) -> Limits {
        Limits {
            compile_time_limit: overrides.compile_time_limit.or(self.compile_time_limit),
            run_time_limit: overrides.run_time_limit.or(self.run_time_limit),
            max_output: overrides.max_output.or(self.max_output),
        }
    }

    pub fn compile_timeout(&self) -> Option<Duration> {
        self.compile_time_limit.and_then(seconds_to_duration)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_time_limit.and_then(seconds_to_duration)
    }

    /// Output bound in bytes
    pub fn max_output_bytes(&self) -> Option<usize> {
        self.max_output
            .map(|kb| usize::try_from(kb.saturating_mul(1024)).unwrap_or(usize::MAX))
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            compile_time_limit: Some(60.0),
            run_time_limit: Some(5.0),
            max_output: Some(1024), // 1 MB per stream
        }
    }
}

/// A set limit always yields a bound: values that are not a positive finite
/// number of seconds (rejected when loading config) become an immediate
/// timeout or the largest representable one.
fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_nan() || seconds <= 0.0 {
        return Some(Duration::ZERO);
    }
    Some(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
}
