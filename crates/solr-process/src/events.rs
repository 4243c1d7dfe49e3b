//! Notifications produced by a spawned worker.

use std::process::ExitStatus;

/// Why the process went away when it did not report an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    /// The owning handle was closed on purpose.
    Normal,
    /// The OS terminated the process with this signal number.
    Signal(i32),
}

/// Asynchronous event delivered from a [`crate::ProcessHandle`] to its owner.
///
/// Each event is produced once and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitEvent {
    /// One line of merged stdout/stderr output, without the trailing newline.
    OutputLine(Vec<u8>),
    /// The process exited with a status code.
    ExitedWithStatus(i32),
    /// The process was killed, either by a signal or by closing its handle.
    KilledBySignal(KillReason),
}

impl ExitEvent {
    /// Whether this event means the process is gone.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExitEvent::OutputLine(_))
    }
}

/// Translate an OS exit status into the matching event.
///
/// A status with neither a code nor a signal (not expected on supported
/// platforms) maps to `ExitedWithStatus(-1)`.
pub fn exit_event_from_status(status: ExitStatus) -> ExitEvent {
    if let Some(code) = status.code() {
        return ExitEvent::ExitedWithStatus(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitEvent::KilledBySignal(KillReason::Signal(signal));
        }
    }

    ExitEvent::ExitedWithStatus(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_line_is_not_terminal() {
        assert!(!ExitEvent::OutputLine(b"started".to_vec()).is_terminal());
        assert!(ExitEvent::ExitedWithStatus(0).is_terminal());
        assert!(ExitEvent::KilledBySignal(KillReason::Normal).is_terminal());
    }

    #[test]
    #[cfg(unix)]
    fn test_exit_status_translation() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait status: exit code lives in bits 8..16.
        let exited = ExitStatus::from_raw(3 << 8);
        assert_eq!(exit_event_from_status(exited), ExitEvent::ExitedWithStatus(3));

        // Raw wait status: low 7 bits carry the terminating signal.
        let killed = ExitStatus::from_raw(9);
        assert_eq!(
            exit_event_from_status(killed),
            ExitEvent::KilledBySignal(KillReason::Signal(9))
        );
    }
}
