//! Internal command protocol for the supervisor actor.
//!
//! These types never leave the supervisor module; callers go through
//! [`super::Supervisor`].

use super::types::SupervisorInfo;
use solr_common::SupervisorResult;
use solr_process_state::SupervisorPhase;
use tokio::sync::oneshot;

pub(super) enum SupervisorCommand {
    /// Current OS pid of the worker, if running
    GetProcessId { resp: oneshot::Sender<Option<u32>> },
    /// Current lifecycle phase
    GetPhase { resp: oneshot::Sender<SupervisorPhase> },
    /// Full status snapshot
    GetInfo { resp: oneshot::Sender<SupervisorInfo> },
    /// Orderly shutdown (idempotent)
    Shutdown {
        resp: oneshot::Sender<SupervisorResult<()>>,
    },
}
