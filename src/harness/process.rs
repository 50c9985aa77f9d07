//! Subprocess supervision shared by the compile and execute stages.
//!
//! Each child runs in its own process group with stdin closed and stdout and
//! stderr captured by two independent reader tasks. When the child exits or
//! its budget expires, the whole group is killed, which takes any
//! grandchild still in the group with it, then the readers are drained.
//!
//! A descendant that calls `setsid` or `setpgid` leaves the group and is not
//! killed. If it also keeps the output pipes open, the drain gives up after
//! [`DRAIN_GRACE`] and the stage fails with a supervision error. Guests run
//! under the default wasm runtime cannot spawn processes at all.

use super::config::ToolCommand;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How long to wait for the output pipes to close after the group is killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Output and exit status of a process that ran to completion.
#[derive(Debug)]
pub(crate) struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitStatus,
}

/// Why a supervised process did not run to completion.
#[derive(Debug)]
pub(crate) enum ProcessError {
    /// `spawn` failed.
    Launch(io::Error),
    /// The budget expired; the process group was killed.
    TimedOut { stdout: Vec<u8>, stderr: Vec<u8> },
    /// Waiting on the child or reading its pipes failed.
    Supervision(String),
}

/// Builds a command for `tool` with the harness's standard stdio and group setup.
pub(crate) fn command(tool: &ToolCommand, cwd: &Path) -> Command {
    let mut std_cmd = std::process::Command::new(&tool.program);
    std_cmd
        .args(&tool.args)
        .envs(&tool.env)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        std_cmd.process_group(0);
    }

    let mut cmd = Command::from(std_cmd);
    cmd.kill_on_drop(true);
    cmd
}

/// Runs `cmd` to completion or until `limit` expires.
pub(crate) async fn run_captured(
    mut cmd: Command,
    limit: Duration,
) -> Result<Captured, ProcessError> {
    let mut child = cmd.spawn().map_err(ProcessError::Launch)?;
    let mut group = ProcessGroup::new(child.id());
    tracing::debug!(pid = ?child.id(), limit_ms = limit.as_millis() as u64, "process spawned");

    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let waited = tokio::time::timeout(limit, child.wait()).await;
    group.kill();

    let status = match waited {
        Ok(Ok(status)) => Some(status),
        Ok(Err(e)) => {
            stdout.abort();
            stderr.abort();
            let _ = child.kill().await;
            return Err(ProcessError::Supervision(format!(
                "waiting on process failed: {e}"
            )));
        }
        Err(_) => {
            tracing::warn!(limit_ms = limit.as_millis() as u64, "process timed out, killed");
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to reap timed out process");
            }
            None
        }
    };

    let stdout = drain(stdout).await?;
    let stderr = drain(stderr).await?;

    match status {
        Some(status) => {
            tracing::debug!(
                exit_code = ?status.code(),
                stdout_bytes = stdout.len(),
                stderr_bytes = stderr.len(),
                "process exited"
            );
            Ok(Captured {
                stdout,
                stderr,
                status,
            })
        }
        None => Err(ProcessError::TimedOut { stdout, stderr }),
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn drain(reader: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, ProcessError> {
    let abort = reader.abort_handle();
    match tokio::time::timeout(DRAIN_GRACE, reader).await {
        Ok(Ok(Ok(buf))) => Ok(buf),
        Ok(Ok(Err(e))) => Err(ProcessError::Supervision(format!(
            "reading process output failed: {e}"
        ))),
        Ok(Err(e)) => Err(ProcessError::Supervision(format!(
            "output reader task failed: {e}"
        ))),
        Err(_) => {
            // A process outside the group still holds the pipe open.
            abort.abort();
            Err(ProcessError::Supervision(
                "output pipe stayed open after the process group was killed".to_string(),
            ))
        }
    }
}

/// Kills a child's process group once, explicitly or on drop.
#[derive(Debug)]
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Sends SIGKILL to every process still in group `pgid`.
///
/// Processes that moved to another group or session are out of reach.
#[cfg(unix)]
fn kill_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}
