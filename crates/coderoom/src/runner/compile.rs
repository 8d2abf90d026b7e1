//! Compilation step for compiled languages
//!
//! Runs the language's build command inside the workspace and reports the
//! artifact it is expected to produce.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::config::{CompileConfig, Config, Language};
use crate::process::{self, ShellCommand};
use crate::runner::ExecuteError;
use crate::types::Limits;
use crate::workspace::Workspace;

/// Result of a successful compilation
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Path of the produced artifact
    pub artifact: PathBuf,

    /// Compiler diagnostics printed despite success (warnings)
    pub warnings: String,

    pub elapsed: Duration,
}

/// Compile the workspace source.
///
/// The artifact is registered for cleanup before the compiler runs so that a
/// partially written binary is removed even when compilation fails.
#[instrument(skip_all, fields(id = workspace.id()))]
pub async fn compile(
    config: &Config,
    limits: &Limits,
    workspace: &mut Workspace,
    compile: &CompileConfig,
) -> Result<CompileOutput, ExecuteError> {
    let mut values = workspace.placeholders();
    let artifact_name = Language::expand_name(compile.artifact_template(), &values);
    let artifact = workspace.file_path(&artifact_name)?;
    workspace.register_for_cleanup(&artifact);
    values.artifact = artifact.to_string_lossy().into_owned();

    let script = Language::expand_command(&compile.command, &values);
    let command = ShellCommand::new(&config.shell, script)
        .working_dir(workspace.dir())
        .timeout(limits.compile_timeout())
        .max_output(limits.max_output_bytes());

    let output = process::run(command).await?;

    debug!(
        artifact = %artifact.display(),
        elapsed_ms = output.elapsed.as_millis() as u64,
        "compilation complete"
    );

    Ok(CompileOutput {
        artifact,
        warnings: output.stderr,
        elapsed: output.elapsed,
    })
}
