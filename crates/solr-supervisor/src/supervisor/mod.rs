//! Supervisor for one search worker - actor-based lifecycle management.
//!
//! ## Startup
//!
//! `start()` runs to completion before any handle exists:
//! 1. Build the launch command (fails with `SpawnFailed` if Java is missing)
//! 2. Spawn the worker
//! 3. Poll the readiness probe once per second while draining worker events
//!
//! A worker that dies while being polled fails the start immediately with
//! `ExitedDuringStartup`. A worker that never becomes ready is terminated
//! and the start fails with `ReadinessTimedOut`. A successful return means
//! the worker answered the probe.
//!
//! ## Running
//!
//! A single actor task owns the process handle and the state machine. The
//! `Supervisor` handle sends it commands over a bounded channel; exit events
//! arrive on a second channel. The actor uses a *biased* `select!` with
//! commands first. Once a shutdown has been processed, every later exit
//! event is expected, so a worker that dies from the shutdown signal is
//! never reported as a crash.
//!
//! ## Stop reasons
//!
//! The terminal outcome is published on a `watch` channel:
//! - `Normal` after `shutdown()`
//! - `AbnormalExit(cause)` when the worker goes away on its own, including
//!   a clean exit with status 0
//!
//! Dropping every `Supervisor` clone triggers the same shutdown as calling
//! `shutdown()`. `shutdown()` never waits for the process itself;
//! `wait_for_exit()` does, bounded by the grace period.

mod actor;
mod commands;
mod handle;
mod types;

#[cfg(test)]
mod tests;

pub use handle::Supervisor;
pub use types::SupervisorInfo;

use crate::command::CommandBuilder;
use crate::config::SupervisorConfig;
use crate::exit_monitor::{exit_cause, ExitMonitor};
use actor::SupervisorActor;
use solr_common::{ExitCause, StopReason, SupervisorError, SupervisorResult};
use solr_log_collection::OutputSink;
use solr_monitoring::{ReadinessOutcome, ReadinessPoller, ReadinessProbe};
use solr_process::{terminate_gracefully, ExitEvent, ProcessHandle, WorkerCommand};
use solr_process_state::SupervisorStateMachine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use types::SupervisorState;

/// Slack on top of the grace period for the kill and reap to complete.
pub(crate) const EXIT_WAIT_MARGIN: Duration = Duration::from_secs(2);

/// How the startup wait ended.
enum StartupOutcome {
    Readiness(ReadinessOutcome),
    Died(ExitCause),
}

impl Supervisor {
    /// Launch the worker described by `config` and wait until it is ready.
    pub async fn start(
        config: SupervisorConfig,
        probe: Arc<dyn ReadinessProbe>,
        sink: Arc<dyn OutputSink>,
    ) -> SupervisorResult<Self> {
        info!(
            "Starting worker {} in {} on port {}",
            config.id,
            config.directory.display(),
            config.listen_port
        );

        let command = match CommandBuilder::new(&config).build() {
            Ok(command) => command,
            Err(e) => {
                report_init_failure(&config.id, &e);
                return Err(e);
            }
        };

        Self::launch(config, command, probe, sink).await
    }

    /// Like [`Supervisor::start`], with an already built command.
    pub async fn launch(
        config: SupervisorConfig,
        command: WorkerCommand,
        probe: Arc<dyn ReadinessProbe>,
        sink: Arc<dyn OutputSink>,
    ) -> SupervisorResult<Self> {
        let id = config.id.clone();
        let mut state_machine = SupervisorStateMachine::new(&id);

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let handle = match ProcessHandle::spawn(&id, &command, config.grace_period, events_tx) {
            Ok(handle) => handle,
            Err(e) => {
                let err = SupervisorError::spawn_failed(&id, e.to_string());
                record_init_failed(&mut state_machine, &err);
                report_init_failure(&id, &err);
                return Err(err);
            }
        };

        let mut monitor = ExitMonitor::new(id.as_str(), sink);
        let poller = ReadinessPoller::new(id.as_str(), config.startup_wait_attempts);

        let outcome = {
            let ready = poller.wait_until_ready(probe.as_ref());
            tokio::pin!(ready);

            loop {
                tokio::select! {
                    biased;

                    Some(event) = events_rx.recv() => {
                        if let ExitEvent::OutputLine(line) = event {
                            monitor.forward(line);
                            continue;
                        }
                        match exit_cause(&event) {
                            Some(cause) => break StartupOutcome::Died(cause),
                            None => warn!("Unexpected event for {} during startup: {:?}", id, event),
                        }
                    }

                    outcome = &mut ready => break StartupOutcome::Readiness(outcome),
                }
            }
        };

        let err = match outcome {
            StartupOutcome::Readiness(ReadinessOutcome::Ready { attempts }) => {
                debug!("{} ready after {} attempt(s)", id, attempts);
                state_machine.transition_to_running()?;
                return Ok(Self::spawn_actor(config, handle, state_machine, monitor, events_rx));
            }
            StartupOutcome::Readiness(ReadinessOutcome::TimedOut { attempts }) => {
                terminate_startup(&id, &handle, config.grace_period).await;
                SupervisorError::readiness_timed_out(&id, attempts)
            }
            StartupOutcome::Died(cause) => {
                handle.force_close();
                SupervisorError::exited_during_startup(&id, cause)
            }
        };

        monitor.flush();
        record_init_failed(&mut state_machine, &err);
        report_init_failure(&id, &err);
        Err(err)
    }

    fn spawn_actor(
        config: SupervisorConfig,
        handle: ProcessHandle,
        state_machine: SupervisorStateMachine,
        monitor: ExitMonitor,
        events_rx: mpsc::UnboundedReceiver<ExitEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (stop_tx, stop_rx) = watch::channel(None);
        let released = handle.released();

        let state = SupervisorState {
            directory: config.directory,
            handle,
            listen_port: config.listen_port,
            diagnostic_port: config.diagnostic_port,
        };

        info!(
            "Worker {} running (PID: {:?})",
            config.id,
            state.handle.process_id()
        );

        let actor = SupervisorActor::new(config.id.clone(), state_machine, state, monitor, stop_tx);
        tokio::spawn(actor.run(cmd_rx, events_rx));

        Supervisor {
            id: config.id,
            cmd_tx,
            stop_rx,
            released,
            grace_period: config.grace_period,
        }
    }
}

/// Stop a worker that never became ready and wait for it to be reaped.
async fn terminate_startup(id: &str, handle: &ProcessHandle, grace_period: Duration) {
    if let Some(pid) = handle.process_id() {
        info!("Terminating {} (PID: {}) after failed startup", id, pid);
        if let Err(e) = terminate_gracefully(pid) {
            warn!("Failed to signal {} (PID: {}): {}", id, pid, e);
        }
    }
    handle.force_close();

    let limit = grace_period + EXIT_WAIT_MARGIN;
    if tokio::time::timeout(limit, handle.wait_released()).await.is_err() {
        warn!("{} not reaped within {:?} after failed startup", id, limit);
    }
}

fn record_init_failed(state_machine: &mut SupervisorStateMachine, err: &SupervisorError) {
    if let Err(e) = state_machine.transition_to_init_failed(err.to_string()) {
        debug!("Could not record init failure: {}", e);
    }
}

fn report_init_failure(id: &str, err: &SupervisorError) {
    let reason = StopReason::InitFailed {
        reason: err.to_string(),
    };
    error!("Supervisor {} stopped: {}", id, reason);
}
