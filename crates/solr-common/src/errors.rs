//! Error types for the supervisor workspace.
//!
//! Two layers:
//! - [`ProcessError`] for low-level OS operations (spawn, signal, lookup).
//! - [`SupervisorError`] for everything surfaced from `Supervisor::start`
//!   and the supervisor handle.
//!
//! An abnormal worker exit while running is *not* an error value. It is
//! reported asynchronously as [`crate::StopReason::AbnormalExit`].

use crate::types::ExitCause;
use thiserror::Error;

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Result type for supervisor operations.
pub type SupervisorResult<T> = std::result::Result<T, SupervisorError>;

// ==============================================================================
// Process Errors
// ==============================================================================

/// Process-level error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Executable not found on search path: {executable} - {reason}")]
    ExecutableNotFound { executable: String, reason: String },

    #[error("Process spawn failed: {id} - {reason}")]
    SpawnFailed { id: String, reason: String },

    #[error("Process stop failed: {id} - {reason}")]
    StopFailed { id: String, reason: String },

    #[error("Process configuration error: {id} - {reason}")]
    Configuration { id: String, reason: String },

    #[error("Output sink error: {id} - {reason}")]
    OutputFailed { id: String, reason: String },
}

impl ProcessError {
    pub fn executable_not_found(executable: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutableNotFound {
            executable: executable.into(),
            reason: reason.into(),
        }
    }

    pub fn spawn_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn stop_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn output_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OutputFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

// ==============================================================================
// Supervisor Errors
// ==============================================================================

/// Errors surfaced by the supervisor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// Executable missing from the search path, or the OS refused to create
    /// the process.
    #[error("Worker spawn failed: {id} - {reason}")]
    SpawnFailed { id: String, reason: String },

    /// The readiness probe never succeeded within the attempt budget.
    #[error("Worker did not become ready: {id} - gave up after {attempts} attempts")]
    ReadinessTimedOut { id: String, attempts: u32 },

    /// The worker terminated before it became ready.
    #[error("Worker exited during startup: {id} - {cause}")]
    ExitedDuringStartup { id: String, cause: ExitCause },

    /// The worker was not reaped within the grace period after shutdown.
    #[error("Worker did not exit: {id} - still running after {waited_ms}ms")]
    ExitTimedOut { id: String, waited_ms: u64 },

    #[error("Invalid supervisor transition: {id} - expected {expected}, got {actual}")]
    InvalidTransition {
        id: String,
        expected: String,
        actual: String,
    },

    /// The supervisor actor is gone (all work finished or it panicked).
    #[error("Supervisor unavailable: {id} - {context}")]
    ActorUnavailable { id: String, context: String },
}

impl SupervisorError {
    pub fn spawn_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn readiness_timed_out(id: impl Into<String>, attempts: u32) -> Self {
        Self::ReadinessTimedOut {
            id: id.into(),
            attempts,
        }
    }

    pub fn exited_during_startup(id: impl Into<String>, cause: ExitCause) -> Self {
        Self::ExitedDuringStartup {
            id: id.into(),
            cause,
        }
    }

    pub fn exit_timed_out(id: impl Into<String>, waited: std::time::Duration) -> Self {
        Self::ExitTimedOut {
            id: id.into(),
            waited_ms: waited.as_millis() as u64,
        }
    }

    pub fn invalid_transition(
        id: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            id: id.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn actor_unavailable(id: impl Into<String>, context: impl Into<String>) -> Self {
        Self::ActorUnavailable {
            id: id.into(),
            context: context.into(),
        }
    }
}
