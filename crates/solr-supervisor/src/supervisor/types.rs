//! Shared data types for the supervisor module.

use solr_common::StopReason;
use solr_process::ProcessHandle;
use solr_process_state::{PhaseTransition, SupervisorPhase};
use std::path::PathBuf;

/// Everything the actor owns about a worker that became ready.
///
/// Only ever built after a successful spawn and readiness wait.
pub(crate) struct SupervisorState {
    pub directory: PathBuf,
    pub handle: ProcessHandle,
    pub listen_port: String,
    pub diagnostic_port: Option<String>,
}

/// Snapshot returned by [`crate::Supervisor::info`].
#[derive(Debug, Clone)]
pub struct SupervisorInfo {
    pub id: String,
    pub phase: SupervisorPhase,
    pub pid: Option<u32>,
    pub directory: PathBuf,
    pub listen_port: String,
    pub diagnostic_port: Option<String>,
    pub output_lines: u64,
    pub stop_reason: Option<StopReason>,
    pub transitions: Vec<PhaseTransition>,
}
