//! Domain types describing how a supervised worker stopped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the OS reported when the worker died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCause {
    /// The process exited on its own with this status code.
    Status(i32),
    /// The process was terminated by this signal number.
    Signal(i32),
}

impl fmt::Display for ExitCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCause::Status(code) => write!(f, "exit status {}", code),
            ExitCause::Signal(signal) => write!(f, "killed by signal {}", signal),
        }
    }
}

/// Terminal stop reason delivered to whoever owns a supervisor.
///
/// ```
/// use solr_common::{ExitCause, StopReason};
///
/// let reason = StopReason::AbnormalExit(ExitCause::Status(3));
/// assert!(reason.is_failure());
/// assert_eq!(reason.exit_cause(), Some(ExitCause::Status(3)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// Orderly shutdown requested by the owner.
    Normal,
    /// The worker never reached the running state.
    InitFailed { reason: String },
    /// The worker died while running without a shutdown request.
    AbnormalExit(ExitCause),
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        !matches!(self, StopReason::Normal)
    }

    pub fn exit_cause(&self) -> Option<ExitCause> {
        match self {
            StopReason::AbnormalExit(cause) => Some(*cause),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Normal => write!(f, "normal"),
            StopReason::InitFailed { reason } => write!(f, "init failed: {}", reason),
            StopReason::AbnormalExit(cause) => write!(f, "abnormal exit: {}", cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Normal.to_string(), "normal");
        assert_eq!(
            StopReason::AbnormalExit(ExitCause::Signal(9)).to_string(),
            "abnormal exit: killed by signal 9"
        );
        assert_eq!(
            StopReason::InitFailed {
                reason: "timeout".to_string()
            }
            .to_string(),
            "init failed: timeout"
        );
    }

    #[test]
    fn test_normal_is_not_failure() {
        assert!(!StopReason::Normal.is_failure());
        assert_eq!(StopReason::Normal.exit_cause(), None);
    }
}
