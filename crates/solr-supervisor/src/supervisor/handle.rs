//! Supervisor handle - public API for a started worker.
//!
//! `Supervisor` is a cheap clone. Every method sends a command to the actor
//! and awaits its answer. Dropping the last clone shuts the worker down.

use super::commands::SupervisorCommand;
use super::types::SupervisorInfo;
use super::EXIT_WAIT_MARGIN;
use solr_common::{StopReason, SupervisorError, SupervisorResult};
use solr_process_state::SupervisorPhase;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct Supervisor {
    pub(super) id: String,
    pub(super) cmd_tx: mpsc::Sender<SupervisorCommand>,
    pub(super) stop_rx: watch::Receiver<Option<StopReason>>,
    pub(super) released: CancellationToken,
    pub(super) grace_period: Duration,
}

impl Supervisor {
    fn map_send_err(&self, context: &str) -> SupervisorError {
        SupervisorError::actor_unavailable(&self.id, format!("{}: channel closed", context))
    }

    fn map_recv_err(&self, context: &str) -> SupervisorError {
        SupervisorError::actor_unavailable(&self.id, format!("{}: response dropped", context))
    }

    async fn request<T>(
        &self,
        context: &str,
        make: impl FnOnce(oneshot::Sender<T>) -> SupervisorCommand,
    ) -> SupervisorResult<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| self.map_send_err(context))?;
        rx.await.map_err(|_| self.map_recv_err(context))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// OS pid of the worker while it is running; `None` in every other phase.
    pub async fn get_process_id(&self) -> Option<u32> {
        self.request("get_process_id", |resp| SupervisorCommand::GetProcessId { resp })
            .await
            .ok()
            .flatten()
    }

    /// Stop the worker: `SIGTERM` to its pid, then release the handle.
    ///
    /// Returns once the supervisor is `Stopped`; does not wait for the
    /// process to exit (see [`Supervisor::wait_for_exit`]). Calling it again,
    /// or after the worker crashed, is a no-op that succeeds.
    pub async fn shutdown(&self) -> SupervisorResult<()> {
        self.request("shutdown", |resp| SupervisorCommand::Shutdown { resp })
            .await?
    }

    /// Wait until the worker process has been reaped.
    ///
    /// After `shutdown()` the worker has the grace period to exit before it
    /// is killed. Fails with `ExitTimedOut` if the process is still there
    /// once the grace period plus a short margin has passed.
    pub async fn wait_for_exit(&self) -> SupervisorResult<()> {
        let limit = self.grace_period + EXIT_WAIT_MARGIN;
        tokio::time::timeout(limit, self.released.cancelled())
            .await
            .map_err(|_| SupervisorError::exit_timed_out(&self.id, limit))
    }

    pub async fn phase(&self) -> SupervisorResult<SupervisorPhase> {
        self.request("phase", |resp| SupervisorCommand::GetPhase { resp })
            .await
    }

    pub async fn info(&self) -> SupervisorResult<SupervisorInfo> {
        self.request("info", |resp| SupervisorCommand::GetInfo { resp })
            .await
    }

    /// Stop reason, if the supervisor has stopped.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_rx.borrow().clone()
    }

    /// Wait until the supervisor reaches a terminal phase.
    pub async fn stopped(&self) -> SupervisorResult<StopReason> {
        let mut rx = self.stop_rx.clone();
        let reason = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| self.map_recv_err("stopped"))?
            .clone();
        reason.ok_or_else(|| self.map_recv_err("stopped"))
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("id", &self.id)
            .field("stop_reason", &*self.stop_rx.borrow())
            .field("released", &self.released.is_cancelled())
            .finish()
    }
}
