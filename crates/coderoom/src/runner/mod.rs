//! Request dispatcher for coderoom
//!
//! Resolves the language of a request, allocates a workspace, drives the
//! language pipeline and normalizes expected failures into results.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, instrument};

pub use crate::runner::compile::{CompileOutput, compile};
pub use crate::runner::document::render;
pub use crate::runner::execute::execute;
pub use crate::runner::naming::public_class_name;

mod compile;
mod document;
mod execute;
mod naming;

use crate::{
    config::{Config, Language, Pipeline, SourceNaming},
    process::ProcessError,
    types::{ExecutionRequest, ExecutionResult},
    workspace::{Workspace, WorkspaceRoot},
};

/// Errors that prevent a request from producing a result
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Source code is empty")]
    EmptySource,

    #[error("No public class found in {language} source")]
    MissingPublicClass { language: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("process error: {0}")]
    Process(#[from] ProcessError),
}

impl ExecuteError {
    /// Whether the request itself is at fault, rather than the service
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExecuteError::UnsupportedLanguage(_)
                | ExecuteError::EmptySource
                | ExecuteError::MissingPublicClass { .. }
        )
    }
}

/// High-level entry point for running requests
///
/// Cheap to clone; clones share the configuration and workspace root, so one
/// executor can serve any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct Executor {
    config: Arc<Config>,
    root: Arc<WorkspaceRoot>,
}

impl Executor {
    /// Create an executor, creating the workspace root if absent
    pub fn new(config: Config) -> Result<Self, ExecuteError> {
        let root = WorkspaceRoot::prepare(&config.temp_dir)?;
        Ok(Self {
            config: Arc::new(config),
            root: Arc::new(root),
        })
    }

    /// Create an executor with the embedded default configuration
    pub fn with_defaults() -> Result<Self, ExecuteError> {
        Self::new(Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &WorkspaceRoot {
        &self.root
    }

    /// Compile (where applicable) and run a request.
    ///
    /// Failures of the submitted program come back as `Ok` with empty output
    /// and the failure text in `error`. `Err` means the request was rejected
    /// or the service itself failed.
    ///
    /// Every file created for the request is removed before this returns.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecuteError> {
        let (id, language) = self
            .config
            .find_language(&request.language)
            .ok_or_else(|| ExecuteError::UnsupportedLanguage(request.language.clone()))?;

        if request.code.is_empty() {
            return Err(ExecuteError::EmptySource);
        }

        let stem = match language.source_name {
            SourceNaming::RequestId => None,
            SourceNaming::PublicClass => Some(public_class_name(&request.code).ok_or_else(
                || ExecuteError::MissingPublicClass {
                    language: language.name.clone(),
                },
            )?),
        };

        let mut workspace = self
            .root
            .allocate(language.extension.as_str(), stem)
            .await?;
        debug!(language = id, workspace = workspace.id(), "dispatching request");

        let outcome = self.run_pipeline(&mut workspace, language, request).await;
        workspace.release().await;

        match outcome {
            Err(ExecuteError::Process(ProcessError::Failed(failure))) => {
                debug!(reason = %failure.reason, "normalizing program failure");
                Ok(ExecutionResult::failure(failure.message()))
            }
            other => other,
        }
    }

    /// Convenience wrapper around [`execute()`](Self::execute)
    pub async fn execute_code(
        &self,
        code: impl Into<String>,
        language: impl Into<String>,
        input: Option<String>,
    ) -> Result<ExecutionResult, ExecuteError> {
        let request = ExecutionRequest {
            code: code.into(),
            language: language.into(),
            input,
        };
        self.execute(&request).await
    }

    async fn run_pipeline(
        &self,
        workspace: &mut Workspace,
        language: &Language,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecuteError> {
        let Some(pipeline) = language.pipeline() else {
            return Err(ExecuteError::UnsupportedLanguage(request.language.clone()));
        };
        let limits = self.config.effective_limits(language);

        if let Some(input) = request.effective_input() {
            workspace.write_input(input).await?;
        }
        workspace.write_source(&request.code).await?;

        match pipeline {
            Pipeline::Compiled(compile_config, run_config) => {
                let started = Instant::now();
                let compiled = compile(&self.config, &limits, workspace, compile_config).await?;

                let mut values = workspace.placeholders();
                values.artifact = compiled.artifact.to_string_lossy().into_owned();
                let output = execute(&self.config, &limits, workspace, run_config, &values).await?;

                Ok(ExecutionResult::completed(
                    output.stdout,
                    output.stderr,
                    started.elapsed(),
                ))
            }
            Pipeline::Interpreted(run_config) => {
                let values = workspace.placeholders();
                let output = execute(&self.config, &limits, workspace, run_config, &values).await?;
                Ok(ExecutionResult::completed(
                    output.stdout,
                    output.stderr,
                    output.elapsed,
                ))
            }
            Pipeline::Document(document_config) => {
                render(&self.config, &limits, workspace, document_config).await
            }
        }
    }
}
