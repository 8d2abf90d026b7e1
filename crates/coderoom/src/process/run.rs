//! Process spawning and output capture

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, instrument, warn};

use crate::process::command::ShellCommand;
use crate::process::{FailureReason, ProcessError, ProcessFailure, ProcessOutput};

/// How long to wait for the output pipes to close once the outcome is known
const DRAIN_GRACE: Duration = Duration::from_millis(500);

enum Outcome {
    Exited(ExitStatus),
    TimedOut,
    OutputLimit,
}

/// Run a shell command to completion.
///
/// The shell is started in its own process group. When the wall clock bound
/// or the output bound is hit, the whole group is killed so that programs
/// started by the shell do not outlive the call. Processes left running in
/// the background after the shell exits are killed as well.
///
/// A process that escaped the group (`setsid`, daemons) can keep the output
/// pipes open. Reading stops [`DRAIN_GRACE`] after the outcome is known and
/// whatever was captured up to then is returned.
#[instrument(skip(command), fields(script = command.script()))]
pub async fn run(command: ShellCommand) -> Result<ProcessOutput, ProcessError> {
    let args = command.build();
    debug!(?args, "running shell command");

    let mut cmd = Command::new(&args[0]);
    cmd.args(&args[1..])
        .envs(command.get_env())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);
    if let Some(dir) = command.get_working_dir() {
        cmd.current_dir(dir);
    }

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| ProcessError::SpawnFailed {
        shell: command.shell().to_path_buf(),
        source,
    })?;
    let pid = child.id();

    let limit = command.get_max_output();
    let overflow = Arc::new(Notify::new());
    let stdout_capture = SharedCapture::default();
    let stderr_capture = SharedCapture::default();
    let mut stdout_reader = tokio::spawn(read_bounded(
        child.stdout.take(),
        limit,
        stdout_capture.clone(),
        overflow.clone(),
    ));
    let mut stderr_reader = tokio::spawn(read_bounded(
        child.stderr.take(),
        limit,
        stderr_capture.clone(),
        overflow.clone(),
    ));

    let timeout = command.get_timeout();
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };

    let outcome = tokio::select! {
        status = child.wait() => Outcome::Exited(status?),
        () = deadline => Outcome::TimedOut,
        () = overflow.notified() => Outcome::OutputLimit,
    };

    kill_group(pid);
    if !matches!(outcome, Outcome::Exited(_))
        && let Err(e) = child.kill().await
    {
        debug!(error = %e, "child already gone");
    }

    let drained = tokio::time::timeout(DRAIN_GRACE, async {
        let stdout = (&mut stdout_reader).await;
        let stderr = (&mut stderr_reader).await;
        (stdout, stderr)
    })
    .await;
    match drained {
        Ok((stdout, stderr)) => {
            stdout.map_err(std::io::Error::other)??;
            stderr.map_err(std::io::Error::other)??;
        }
        Err(_) => {
            warn!(
                grace_ms = DRAIN_GRACE.as_millis() as u64,
                "output pipes held open by a process outside the group, detaching"
            );
            stdout_reader.abort();
            stderr_reader.abort();
        }
    }

    let (stdout, stdout_overflow) = stdout_capture.take();
    let (stderr, stderr_overflow) = stderr_capture.take();
    let elapsed = started.elapsed();

    let reason = match outcome {
        Outcome::TimedOut => Some(FailureReason::TimedOut(timeout.unwrap_or_default())),
        Outcome::OutputLimit => Some(FailureReason::OutputLimit(limit.unwrap_or_default())),
        Outcome::Exited(_) if stdout_overflow || stderr_overflow => {
            Some(FailureReason::OutputLimit(limit.unwrap_or_default()))
        }
        Outcome::Exited(status) => exit_reason(status),
    };

    debug!(?reason, elapsed_ms = elapsed.as_millis() as u64, "command finished");

    match reason {
        None => Ok(ProcessOutput {
            stdout,
            stderr,
            elapsed,
        }),
        Some(reason) => Err(ProcessError::Failed(ProcessFailure {
            stdout,
            stderr,
            reason,
            elapsed,
        })),
    }
}

fn exit_reason(status: ExitStatus) -> Option<FailureReason> {
    if status.success() {
        return None;
    }
    match (status.code(), status.signal()) {
        (Some(code), _) => Some(FailureReason::Exited(code)),
        (None, Some(signal)) => Some(FailureReason::Signaled(signal)),
        (None, None) => Some(FailureReason::Exited(-1)),
    }
}

/// Bytes read from one stream, shared with its reader task so that a
/// detached reader does not take the captured output with it
#[derive(Clone, Default)]
struct SharedCapture(Arc<Mutex<Captured>>);

#[derive(Default)]
struct Captured {
    bytes: Vec<u8>,
    overflowed: bool,
}

impl SharedCapture {
    fn lock(&self) -> std::sync::MutexGuard<'_, Captured> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> (String, bool) {
        let mut captured = self.lock();
        let bytes = std::mem::take(&mut captured.bytes);
        (String::from_utf8_lossy(&bytes).into_owned(), captured.overflowed)
    }
}

/// Read a stream to EOF into `capture`, keeping at most `limit` bytes.
///
/// Stops reading (closing the pipe) and notifies `overflow` as soon as the
/// stream goes past the limit.
async fn read_bounded<R>(
    reader: Option<R>,
    limit: Option<usize>,
    capture: SharedCapture,
    overflow: Arc<Notify>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(());
    };

    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }

        let mut captured = capture.lock();
        captured.bytes.extend_from_slice(&chunk[..n]);
        if let Some(limit) = limit
            && captured.bytes.len() > limit
        {
            captured.bytes.truncate(limit);
            captured.overflowed = true;
            drop(captured);
            overflow.notify_one();
            return Ok(());
        }
    }
}

fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(errno) => warn!(pid, %errno, "failed to kill process group"),
    }
}
