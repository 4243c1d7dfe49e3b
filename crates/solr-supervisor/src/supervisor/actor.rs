//! Supervisor actor - owns the running worker and serializes every decision
//! about it.
//!
//! Commands from [`super::Supervisor`] handles and events from the process
//! handle arrive on two channels and are processed one at a time, so a
//! shutdown and an exit notification can never interleave.

use super::commands::SupervisorCommand;
use super::types::{SupervisorInfo, SupervisorState};
use crate::exit_monitor::{ExitMonitor, ExitVerdict};
use solr_common::{ExitCause, StopReason, SupervisorResult};
use solr_process::{terminate_gracefully, ExitEvent};
use solr_process_state::{SupervisorPhase, SupervisorStateMachine};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

pub(super) struct SupervisorActor {
    id: String,
    state_machine: SupervisorStateMachine,
    state: SupervisorState,
    monitor: ExitMonitor,
    stop_tx: watch::Sender<Option<StopReason>>,
    shutdown_requested: bool,
}

impl SupervisorActor {
    /// The state machine must already be in `Running`.
    pub(super) fn new(
        id: String,
        state_machine: SupervisorStateMachine,
        state: SupervisorState,
        monitor: ExitMonitor,
        stop_tx: watch::Sender<Option<StopReason>>,
    ) -> Self {
        Self {
            id,
            state_machine,
            state,
            monitor,
            stop_tx,
            shutdown_requested: false,
        }
    }

    pub(super) async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<SupervisorCommand>,
        mut events_rx: mpsc::UnboundedReceiver<ExitEvent>,
    ) {
        let mut cmd_closed = false;
        let mut events_closed = false;

        loop {
            if cmd_closed && self.phase().is_terminal() {
                break;
            }

            // Commands take priority over worker events.
            tokio::select! {
                biased;

                maybe_cmd = cmd_rx.recv(), if !cmd_closed => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            info!("All handles for {} dropped; shutting down worker", self.id);
                            cmd_closed = true;
                            if let Err(e) = self.shutdown() {
                                error!("Implicit shutdown of {} failed: {}", self.id, e);
                            }
                        }
                    }
                }

                maybe_event = events_rx.recv(), if !events_closed => {
                    match maybe_event {
                        Some(event) => self.handle_event(event),
                        None => {
                            events_closed = true;
                            self.handle_events_closed();
                        }
                    }
                }

                else => break,
            }
        }

        self.monitor.flush();
        info!("Supervisor actor for {} terminated", self.id);
    }

    fn phase(&self) -> SupervisorPhase {
        self.state_machine.current_phase()
    }

    fn handle_command(&mut self, cmd: SupervisorCommand) {
        match cmd {
            SupervisorCommand::GetProcessId { resp } => {
                let _ = resp.send(self.process_id());
            }
            SupervisorCommand::GetPhase { resp } => {
                let _ = resp.send(self.phase());
            }
            SupervisorCommand::GetInfo { resp } => {
                let _ = resp.send(self.info());
            }
            SupervisorCommand::Shutdown { resp } => {
                let _ = resp.send(self.shutdown());
            }
        }
    }

    fn process_id(&self) -> Option<u32> {
        if self.phase() != SupervisorPhase::Running {
            return None;
        }
        self.state.handle.process_id()
    }

    fn info(&self) -> SupervisorInfo {
        SupervisorInfo {
            id: self.id.clone(),
            phase: self.phase(),
            pid: self.process_id(),
            directory: self.state.directory.clone(),
            listen_port: self.state.listen_port.clone(),
            diagnostic_port: self.state.diagnostic_port.clone(),
            output_lines: self.monitor.lines_seen(),
            stop_reason: self.stop_tx.borrow().clone(),
            transitions: self.state_machine.history().to_vec(),
        }
    }

    /// Orderly shutdown. A no-op in every phase but `Running`.
    fn shutdown(&mut self) -> SupervisorResult<()> {
        match self.phase() {
            SupervisorPhase::Running => {}
            phase if phase.is_failure() => {
                warn!("Ignoring shutdown of {} in phase {}", self.id, phase);
                return Ok(());
            }
            phase => {
                debug!("Shutdown of {} already done ({})", self.id, phase);
                return Ok(());
            }
        }

        info!("Shutting down worker {}", self.id);
        self.shutdown_requested = true;
        self.state_machine.transition_to_terminating()?;
        self.terminate_worker();
        self.state_machine.transition_to_stopped()?;
        self.publish(StopReason::Normal);
        Ok(())
    }

    /// Graceful signal to the pid, then release the handle. Never waits.
    fn terminate_worker(&self) {
        match self.state.handle.process_id() {
            Some(pid) => {
                debug!("Sending SIGTERM to {} (PID: {})", self.id, pid);
                if let Err(e) = terminate_gracefully(pid) {
                    warn!("Failed to signal {} (PID: {}): {}", self.id, pid, e);
                }
            }
            None => debug!("No PID for {}; closing handle only", self.id),
        }
        self.state.handle.force_close();
    }

    fn handle_event(&mut self, event: ExitEvent) {
        let phase = self.phase();
        if phase.is_terminal() && event.is_terminal() {
            debug!("Ignoring late event for {} in phase {}: {:?}", self.id, phase, event);
            return;
        }

        match self.monitor.observe(event, self.shutdown_requested) {
            ExitVerdict::Output => {}
            ExitVerdict::Expected => debug!("Exit of {} already handled", self.id),
            ExitVerdict::Abnormal(cause) => self.worker_crashed(cause),
        }
    }

    fn worker_crashed(&mut self, cause: ExitCause) {
        if self.phase() != SupervisorPhase::Running {
            debug!("Ignoring exit of {} in phase {}: {}", self.id, self.phase(), cause);
            return;
        }

        self.state.handle.force_close();
        if let Err(e) = self.state_machine.transition_to_crashed(cause.to_string()) {
            error!("Failed to record crash of {}: {}", self.id, e);
        }
        self.publish(StopReason::AbnormalExit(cause));
    }

    /// Every sender is gone without a terminal event; the watcher cannot report anymore.
    fn handle_events_closed(&mut self) {
        if self.phase() == SupervisorPhase::Running {
            error!("Event stream for {} closed while running", self.id);
            self.worker_crashed(ExitCause::Status(-1));
        } else {
            debug!("Event stream for {} closed", self.id);
        }
    }

    fn publish(&self, reason: StopReason) {
        info!("Supervisor {} stopped: {}", self.id, reason);
        self.stop_tx.send_replace(Some(reason));
    }
}
