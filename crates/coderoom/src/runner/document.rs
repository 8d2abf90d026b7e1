//! Document rendering for markup languages
//!
//! The processor runs several passes over the same source inside the
//! workspace directory. The rendered artifact is returned base64-encoded; when
//! it is missing the processor's log becomes the error.

use std::io;
use std::path::Path;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, instrument, warn};

use crate::config::{Config, DocumentConfig, Language};
use crate::process::{self, ProcessError, ShellCommand};
use crate::runner::ExecuteError;
use crate::types::{ExecutionResult, Limits};
use crate::workspace::Workspace;

/// Error text used when neither the artifact nor a log was produced
const MISSING_LOG_MESSAGE: &str = "Failed to generate document: log file not found";

/// Render the workspace source into a document.
///
/// Process failures and a missing artifact are reported as normalized
/// failure results; only infrastructure errors are returned as `Err`.
#[instrument(skip_all, fields(id = workspace.id()))]
pub async fn render(
    config: &Config,
    limits: &Limits,
    workspace: &mut Workspace,
    document: &DocumentConfig,
) -> Result<ExecutionResult, ExecuteError> {
    let stem = workspace.source_stem().to_owned();
    let artifact = workspace.file_path(&format!("{stem}.{}", document.artifact_extension))?;
    let log = workspace.file_path(&format!("{stem}.{}", document.log_extension))?;

    workspace.register_for_cleanup(&artifact);
    workspace.register_for_cleanup(&log);
    for extension in &document.aux_extensions {
        let aux = workspace.file_path(&format!("{stem}.{extension}"))?;
        workspace.register_for_cleanup(aux);
    }

    let script = Language::expand_command(&document.command, &workspace.placeholders());
    let started = Instant::now();

    for pass in 1..=document.passes {
        let command = ShellCommand::new(&config.shell, script.as_str())
            .working_dir(workspace.dir())
            .timeout(limits.compile_timeout())
            .max_output(limits.max_output_bytes());

        match process::run(command).await {
            Ok(_) => debug!(pass, "render pass complete"),
            Err(ProcessError::Failed(failure)) => {
                debug!(pass, reason = %failure.reason, "render pass failed");
                let message = match read_log(&log).await {
                    Some(text) => filter_errors(&text, &document.error_markers),
                    None => String::new(),
                };
                let message = if message.is_empty() {
                    failure.message()
                } else {
                    message
                };
                return Ok(ExecutionResult::failure(message));
            }
            Err(e) => return Err(e.into()),
        }
    }

    match tokio::fs::read(&artifact).await {
        Ok(bytes) => {
            debug!(bytes = bytes.len(), "document rendered");
            Ok(ExecutionResult::document(
                STANDARD.encode(bytes),
                started.elapsed(),
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(artifact = %artifact.display(), "no artifact produced");
            let message = read_log(&log)
                .await
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| MISSING_LOG_MESSAGE.to_owned());
            Ok(ExecutionResult::failure(message))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read the processor log, which may contain bytes that are not UTF-8
async fn read_log(path: &Path) -> Option<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to read log");
            }
            None
        }
    }
}

/// Keep only the log lines mentioning one of `markers`
fn filter_errors(log: &str, markers: &[String]) -> String {
    log.lines()
        .filter(|line| markers.iter().any(|marker| line.contains(marker.as_str())))
        .collect::<Vec<_>>()
        .join("\n")
}
