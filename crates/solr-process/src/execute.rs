//! Process execution primitives.
//!
//! [`ProcessHandle`] is the single owner of a spawned worker. The `Child`
//! itself lives in a background watcher task which waits on it (so the
//! process is always reaped) and reports how it ended. Stdout and stderr are
//! read line by line and merged into the same event channel.

use crate::events::{exit_event_from_status, ExitEvent, KillReason};
use solr_common::{ProcessError, ProcessResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long a closed handle lets the process exit on its own before killing it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Fully resolved launch command for a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
}

impl WorkerCommand {
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
            working_directory: None,
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}

/// Owned handle to a running worker process.
///
/// Output lines and the final exit report share one event channel. Stdout
/// and stderr are read by separate tasks, so lines keep their order within
/// each stream but not across the two.
///
/// Dropping the handle closes it, exactly like [`ProcessHandle::force_close`].
pub struct ProcessHandle {
    id: String,
    pid: Option<u32>,
    close_token: CancellationToken,
    released: CancellationToken,
}

impl ProcessHandle {
    /// Spawn `command` and start delivering [`ExitEvent`]s to `events`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        id: &str,
        command: &WorkerCommand,
        grace_period: Duration,
        events: UnboundedSender<ExitEvent>,
    ) -> ProcessResult<Self> {
        info!(
            "Spawning worker {}: {} {:?}",
            id,
            command.executable.display(),
            command.args
        );

        let mut cmd = Command::new(&command.executable);
        cmd.args(&command.args);

        if let Some(ref wd) = command.working_directory {
            cmd.current_dir(wd);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ProcessError::spawn_failed(
                id,
                format!("{}: {}", command.executable.display(), e),
            )
        })?;

        let pid = child.id();
        let close_token = CancellationToken::new();
        let released = CancellationToken::new();

        Self::spawn_output_forwarders(id, &mut child, &events, &close_token);

        tokio::spawn(watch_exit(
            id.to_string(),
            child,
            close_token.clone(),
            grace_period,
            events,
            released.clone(),
        ));

        match pid {
            Some(pid) => info!("Worker spawned successfully: {} (PID: {})", id, pid),
            None => warn!("Worker spawned but the OS reported no PID: {}", id),
        }

        Ok(Self {
            id: id.to_string(),
            pid,
            close_token,
            released,
        })
    }

    fn spawn_output_forwarders(
        id: &str,
        child: &mut Child,
        events: &UnboundedSender<ExitEvent>,
        close_token: &CancellationToken,
    ) {
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(
                format!("{}/stdout", id),
                stdout,
                events.clone(),
                close_token.clone(),
            ));
        }

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(
                format!("{}/stderr", id),
                stderr,
                events.clone(),
                close_token.clone(),
            ));
        }

        debug!("Output forwarding started for {}", id);
    }

    /// OS process id, or `None` once the handle is closed, the process has
    /// exited, or the OS never reported one.
    pub fn process_id(&self) -> Option<u32> {
        if self.is_closed() || self.released.is_cancelled() {
            return None;
        }
        self.pid.filter(|pid| *pid > 0)
    }

    /// Whether the OS still knows about the process.
    pub fn is_alive(&self) -> bool {
        match self.process_id() {
            Some(pid) => crate::check::process_exists(pid).unwrap_or(false),
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.close_token.is_cancelled()
    }

    /// Release the handle. Idempotent and non-blocking.
    ///
    /// Output is no longer forwarded. The watcher keeps reaping the process,
    /// kills it if it is still alive after the grace period, and reports
    /// `KilledBySignal(Normal)`.
    pub fn force_close(&self) {
        if self.close_token.is_cancelled() {
            debug!("Handle for {} already closed", self.id);
            return;
        }
        info!("Closing process handle for {}", self.id);
        self.close_token.cancel();
    }

    /// Wait until the watcher has observed the process exit (reaped it).
    pub async fn wait_released(&self) {
        self.released.cancelled().await;
    }

    /// Token cancelled once the process has been reaped.
    ///
    /// Outlives the handle, so an owner can wait for the exit after
    /// handing the handle off.
    pub fn released(&self) -> CancellationToken {
        self.released.clone()
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.close_token.cancel();
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("closed", &self.is_closed())
            .field("released", &self.released.is_cancelled())
            .finish()
    }
}

/// Read one output stream line by line into the event channel.
///
/// After the handle is closed the stream is still drained (so the worker
/// never blocks on a full pipe) but lines are discarded.
async fn forward_output(
    stream_id: String,
    stream: impl AsyncRead + Unpin + Send + 'static,
    events: UnboundedSender<ExitEvent>,
    close_token: CancellationToken,
) {
    let mut segments = BufReader::new(stream).split(b'\n');
    let mut receiver_gone = false;

    loop {
        match segments.next_segment().await {
            Ok(Some(mut line)) => {
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if receiver_gone || close_token.is_cancelled() {
                    continue;
                }
                if events.send(ExitEvent::OutputLine(line)).is_err() {
                    debug!("Event receiver gone, discarding output of {}", stream_id);
                    receiver_gone = true;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read output of {}: {}", stream_id, e);
                break;
            }
        }
    }

    debug!("Output stream {} reached EOF", stream_id);
}

/// Own the child until it exits and report how it ended.
async fn watch_exit(
    id: String,
    mut child: Child,
    close_token: CancellationToken,
    grace_period: Duration,
    events: UnboundedSender<ExitEvent>,
    released: CancellationToken,
) {
    let event = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                if status.success() {
                    info!("Worker {} exited successfully", id);
                } else {
                    warn!("Worker {} exited with status: {}", id, status);
                }
                exit_event_from_status(status)
            }
            Err(e) => {
                error!("Failed to wait for worker {}: {}", id, e);
                ExitEvent::ExitedWithStatus(-1)
            }
        },
        _ = close_token.cancelled() => {
            debug!("Handle for {} closed, reaping with grace period {:?}", id, grace_period);
            match timeout(grace_period, child.wait()).await {
                Ok(Ok(status)) => debug!("Worker {} exited after close: {}", id, status),
                Ok(Err(e)) => warn!("Failed to wait for closed worker {}: {}", id, e),
                Err(_) => {
                    warn!(
                        "Worker {} still alive {:?} after close, force killing",
                        id, grace_period
                    );
                    if let Err(e) = child.kill().await {
                        error!("Force kill failed for {}: {}", id, e);
                    }
                }
            }
            ExitEvent::KilledBySignal(KillReason::Normal)
        }
    };

    released.cancel();

    if events.send(event).is_err() {
        debug!("Event receiver gone before exit of {} was reported", id);
    }
}
