//! Run step for compiled and interpreted programs

use tracing::{debug, instrument};

use crate::config::{Config, Language, Placeholders, RunConfig};
use crate::process::{self, ProcessOutput, ShellCommand};
use crate::runner::ExecuteError;
use crate::types::Limits;
use crate::workspace::Workspace;

/// Run the program described by `run`.
///
/// The input file, if the workspace has one, is redirected to stdin. Programs
/// run from inside the workspace directory receive it by base name.
#[instrument(skip_all, fields(id = workspace.id()))]
pub async fn execute(
    config: &Config,
    limits: &Limits,
    workspace: &Workspace,
    run: &RunConfig,
    values: &Placeholders,
) -> Result<ProcessOutput, ExecuteError> {
    let script = Language::expand_command(&run.command, values);
    let mut command = ShellCommand::new(&config.shell, script)
        .timeout(limits.run_timeout())
        .max_output(limits.max_output_bytes());

    if run.in_workspace_dir {
        command = command.working_dir(workspace.dir());
    }

    if let Some(input) = workspace.input_path() {
        command = match input.file_name() {
            Some(name) if run.in_workspace_dir => command.stdin(name),
            _ => command.stdin(input),
        };
    }

    debug!(script = command.script(), stdin = ?command.get_stdin(), "running program");

    let output = process::run(command).await?;

    debug!(
        stdout_len = output.stdout.len(),
        stderr_len = output.stderr.len(),
        elapsed_ms = output.elapsed.as_millis() as u64,
        "execution complete"
    );

    Ok(output)
}
