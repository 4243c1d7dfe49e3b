use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solr_common::{SupervisorError, SupervisorResult};
use std::fmt;

/// Maximum number of transitions kept in the history.
const MAX_HISTORY: usize = 100;

/// Lifecycle phase of a supervised worker.
///
/// ```text
/// Initializing ──> Running ──> Terminating ──> Stopped
///      │              │
///      └─> InitFailed └─> CrashedStopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorPhase {
    /// Command built, worker being spawned and polled for readiness
    Initializing,
    /// Worker is ready and serving
    Running,
    /// Shutdown requested, termination signal in flight
    Terminating,
    /// Orderly shutdown completed
    Stopped,
    /// Worker never became ready
    InitFailed,
    /// Worker died while running without a shutdown request
    CrashedStopped,
}

impl fmt::Display for SupervisorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorPhase::Initializing => write!(f, "initializing"),
            SupervisorPhase::Running => write!(f, "running"),
            SupervisorPhase::Terminating => write!(f, "terminating"),
            SupervisorPhase::Stopped => write!(f, "stopped"),
            SupervisorPhase::InitFailed => write!(f, "init_failed"),
            SupervisorPhase::CrashedStopped => write!(f, "crashed_stopped"),
        }
    }
}

impl SupervisorPhase {
    /// No further operations are valid in a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SupervisorPhase::Stopped | SupervisorPhase::InitFailed | SupervisorPhase::CrashedStopped
        )
    }

    /// Terminal phases that represent a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, SupervisorPhase::InitFailed | SupervisorPhase::CrashedStopped)
    }
}

/// A recorded phase change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from_phase: SupervisorPhase,
    pub to_phase: SupervisorPhase,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Validates and records lifecycle transitions for one worker.
#[derive(Debug, Clone)]
pub struct SupervisorStateMachine {
    worker_id: String,
    current_phase: SupervisorPhase,
    history: Vec<PhaseTransition>,
}

impl SupervisorStateMachine {
    /// A new machine starts in `Initializing`.
    pub fn new(worker_id: &str) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            current_phase: SupervisorPhase::Initializing,
            history: Vec::new(),
        }
    }

    pub fn current_phase(&self) -> SupervisorPhase {
        self.current_phase
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Check if a transition from the current phase to `target` is valid.
    pub fn is_valid_transition(&self, target: SupervisorPhase) -> bool {
        use SupervisorPhase::*;

        matches!(
            (self.current_phase, target),
            (Initializing, Running)
                | (Initializing, InitFailed)
                | (Running, Terminating)
                | (Running, CrashedStopped)
                | (Terminating, Stopped)
        )
    }

    /// Transition to `target`, recording `reason`.
    pub fn transition_to(
        &mut self,
        target: SupervisorPhase,
        reason: Option<String>,
    ) -> SupervisorResult<()> {
        if !self.is_valid_transition(target) {
            return Err(SupervisorError::invalid_transition(
                &self.worker_id,
                target.to_string(),
                self.current_phase.to_string(),
            ));
        }

        let from = self.current_phase;
        self.history.push(PhaseTransition {
            from_phase: from,
            to_phase: target,
            timestamp: Utc::now(),
            reason,
        });

        self.current_phase = target;

        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }

        tracing::debug!(
            "Worker {} transitioned from {} to {}",
            self.worker_id,
            from,
            target
        );

        Ok(())
    }

    pub fn transition_to_running(&mut self) -> SupervisorResult<()> {
        self.transition_to(SupervisorPhase::Running, Some("Worker reported ready".to_string()))
    }

    pub fn transition_to_init_failed(&mut self, reason: String) -> SupervisorResult<()> {
        self.transition_to(SupervisorPhase::InitFailed, Some(reason))
    }

    pub fn transition_to_terminating(&mut self) -> SupervisorResult<()> {
        self.transition_to(
            SupervisorPhase::Terminating,
            Some("Shutdown requested".to_string()),
        )
    }

    pub fn transition_to_stopped(&mut self) -> SupervisorResult<()> {
        self.transition_to(SupervisorPhase::Stopped, Some("Worker terminated".to_string()))
    }

    pub fn transition_to_crashed(&mut self, reason: String) -> SupervisorResult<()> {
        self.transition_to(SupervisorPhase::CrashedStopped, Some(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_creation() {
        let sm = SupervisorStateMachine::new("solr");
        assert_eq!(sm.current_phase(), SupervisorPhase::Initializing);
        assert!(sm.history().is_empty());
    }

    #[test]
    fn test_orderly_lifecycle() {
        let mut sm = SupervisorStateMachine::new("solr");

        sm.transition_to_running().unwrap();
        sm.transition_to_terminating().unwrap();
        sm.transition_to_stopped().unwrap();

        assert_eq!(sm.current_phase(), SupervisorPhase::Stopped);
        assert_eq!(sm.history().len(), 3);
        assert_eq!(sm.history()[0].from_phase, SupervisorPhase::Initializing);
        assert_eq!(sm.history()[2].to_phase, SupervisorPhase::Stopped);
    }

    #[test]
    fn test_failure_exits() {
        let mut sm = SupervisorStateMachine::new("solr");
        sm.transition_to_init_failed("spawn failed".to_string()).unwrap();
        assert!(sm.current_phase().is_failure());
        assert_eq!(
            sm.history().last().unwrap().reason.as_deref(),
            Some("spawn failed")
        );

        let mut sm = SupervisorStateMachine::new("solr");
        sm.transition_to_running().unwrap();
        sm.transition_to_crashed("exit status 1".to_string()).unwrap();
        assert_eq!(sm.current_phase(), SupervisorPhase::CrashedStopped);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sm = SupervisorStateMachine::new("solr");

        // Must become ready before it can be shut down.
        assert!(sm.transition_to_terminating().is_err());
        assert!(sm.transition_to(SupervisorPhase::Stopped, None).is_err());

        sm.transition_to_running().unwrap();
        sm.transition_to_terminating().unwrap();
        sm.transition_to_stopped().unwrap();

        // Terminal phases accept nothing.
        for target in [
            SupervisorPhase::Initializing,
            SupervisorPhase::Running,
            SupervisorPhase::Terminating,
            SupervisorPhase::Stopped,
            SupervisorPhase::CrashedStopped,
        ] {
            assert!(!sm.is_valid_transition(target), "{} accepted", target);
        }
    }

    #[test]
    fn test_phase_properties() {
        assert!(SupervisorPhase::Stopped.is_terminal());
        assert!(SupervisorPhase::InitFailed.is_terminal());
        assert!(SupervisorPhase::CrashedStopped.is_terminal());
        assert!(!SupervisorPhase::Stopped.is_failure());
        assert!(SupervisorPhase::CrashedStopped.is_failure());
        assert!(!SupervisorPhase::Running.is_terminal());
    }

    #[test]
    fn test_invalid_transition_error() {
        let mut sm = SupervisorStateMachine::new("solr");
        let err = sm.transition_to(SupervisorPhase::Stopped, None).unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidTransition { .. }));
        assert!(err.to_string().contains("expected stopped, got initializing"));
    }
}
