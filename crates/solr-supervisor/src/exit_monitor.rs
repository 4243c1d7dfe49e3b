//! Classification of worker events.
//!
//! | event                       | shutdown requested | verdict          |
//! |-----------------------------|--------------------|------------------|
//! | `OutputLine`                | any                | output           |
//! | `ExitedWithStatus(_)`       | yes                | expected         |
//! | `ExitedWithStatus(n)`       | no                 | abnormal         |
//! | `KilledBySignal(Normal)`    | any                | expected         |
//! | `KilledBySignal(Signal(n))` | yes                | expected         |
//! | `KilledBySignal(Signal(n))` | no                 | abnormal         |

use solr_common::ExitCause;
use solr_log_collection::{OutputEntry, OutputSink};
use solr_process::{ExitEvent, KillReason};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What an event means for the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitVerdict {
    /// A line of output; no state change.
    Output,
    /// The worker is gone and that is fine.
    Expected,
    /// The worker died on its own.
    Abnormal(ExitCause),
}

/// Pure classification, see the module table.
pub fn classify(event: &ExitEvent, shutdown_requested: bool) -> ExitVerdict {
    match event {
        ExitEvent::OutputLine(_) => ExitVerdict::Output,
        ExitEvent::KilledBySignal(KillReason::Normal) => ExitVerdict::Expected,
        _ if shutdown_requested => ExitVerdict::Expected,
        ExitEvent::ExitedWithStatus(code) => ExitVerdict::Abnormal(ExitCause::Status(*code)),
        ExitEvent::KilledBySignal(KillReason::Signal(signal)) => {
            ExitVerdict::Abnormal(ExitCause::Signal(*signal))
        }
    }
}

/// How the process ended, for an event that reports it.
///
/// A deliberate close carries no cause.
pub fn exit_cause(event: &ExitEvent) -> Option<ExitCause> {
    match event {
        ExitEvent::ExitedWithStatus(code) => Some(ExitCause::Status(*code)),
        ExitEvent::KilledBySignal(KillReason::Signal(signal)) => Some(ExitCause::Signal(*signal)),
        ExitEvent::KilledBySignal(KillReason::Normal) | ExitEvent::OutputLine(_) => None,
    }
}

/// Consumes worker events: forwards output to the sink and classifies exits.
pub struct ExitMonitor {
    worker_id: String,
    sink: Arc<dyn OutputSink>,
    lines_seen: u64,
}

impl ExitMonitor {
    pub fn new(worker_id: impl Into<String>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            worker_id: worker_id.into(),
            sink,
            lines_seen: 0,
        }
    }

    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    /// Handle one event and return its verdict.
    pub fn observe(&mut self, event: ExitEvent, shutdown_requested: bool) -> ExitVerdict {
        if let ExitEvent::OutputLine(line) = event {
            self.forward(line);
            return ExitVerdict::Output;
        }

        let verdict = classify(&event, shutdown_requested);
        match verdict {
            ExitVerdict::Expected => {
                info!("Worker {} terminated: {:?}", self.worker_id, event);
            }
            ExitVerdict::Abnormal(ref cause) => {
                error!("Worker {} terminated abnormally: {}", self.worker_id, cause);
            }
            ExitVerdict::Output => {}
        }

        verdict
    }

    /// Hand one output line to the sink. Sink failures are logged, never fatal.
    pub fn forward(&mut self, line: Vec<u8>) {
        self.lines_seen += 1;
        let entry = OutputEntry::new(self.worker_id.as_str(), self.lines_seen, line);
        if let Err(e) = self.sink.write(&entry) {
            warn!("Dropping output line from {}: {}", self.worker_id, e);
        }
    }

    pub fn flush(&self) {
        if let Err(e) = self.sink.flush() {
            debug!("Failed to flush output sink for {}: {}", self.worker_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solr_log_collection::CircularBufferOutputSink;

    #[test]
    fn test_classification_table() {
        use ExitEvent::*;

        let cases = [
            (OutputLine(b"x".to_vec()), false, ExitVerdict::Output),
            (OutputLine(b"x".to_vec()), true, ExitVerdict::Output),
            (ExitedWithStatus(1), true, ExitVerdict::Expected),
            (
                ExitedWithStatus(0),
                false,
                ExitVerdict::Abnormal(ExitCause::Status(0)),
            ),
            (
                ExitedWithStatus(1),
                false,
                ExitVerdict::Abnormal(ExitCause::Status(1)),
            ),
            (
                ExitedWithStatus(-1),
                false,
                ExitVerdict::Abnormal(ExitCause::Status(-1)),
            ),
            (KilledBySignal(KillReason::Normal), false, ExitVerdict::Expected),
            (KilledBySignal(KillReason::Normal), true, ExitVerdict::Expected),
            (KilledBySignal(KillReason::Signal(15)), true, ExitVerdict::Expected),
            (
                KilledBySignal(KillReason::Signal(9)),
                false,
                ExitVerdict::Abnormal(ExitCause::Signal(9)),
            ),
        ];

        for (event, shutdown_requested, expected) in cases {
            assert_eq!(
                classify(&event, shutdown_requested),
                expected,
                "{:?} with shutdown_requested={}",
                event,
                shutdown_requested
            );
        }
    }

    #[test]
    fn test_exit_cause() {
        assert_eq!(
            exit_cause(&ExitEvent::ExitedWithStatus(7)),
            Some(ExitCause::Status(7))
        );
        assert_eq!(
            exit_cause(&ExitEvent::KilledBySignal(KillReason::Signal(11))),
            Some(ExitCause::Signal(11))
        );
        assert_eq!(exit_cause(&ExitEvent::KilledBySignal(KillReason::Normal)), None);
        assert_eq!(exit_cause(&ExitEvent::OutputLine(Vec::new())), None);
    }

    #[test]
    fn test_monitor_forwards_output_in_order() {
        let sink = Arc::new(CircularBufferOutputSink::new(10));
        let mut monitor = ExitMonitor::new("solr", sink.clone());

        for line in ["INFO: Started", "INFO: core1 loaded"] {
            let verdict = monitor.observe(ExitEvent::OutputLine(line.as_bytes().to_vec()), false);
            assert_eq!(verdict, ExitVerdict::Output);
        }

        assert_eq!(monitor.lines_seen(), 2);
        assert_eq!(sink.lines(), vec!["INFO: Started", "INFO: core1 loaded"]);
        assert_eq!(sink.entries()[1].line_number, 2);
    }

    #[test]
    fn test_monitor_does_not_forward_exits() {
        let sink = Arc::new(CircularBufferOutputSink::new(10));
        let mut monitor = ExitMonitor::new("solr", sink.clone());

        let verdict = monitor.observe(ExitEvent::ExitedWithStatus(2), false);
        assert_eq!(verdict, ExitVerdict::Abnormal(ExitCause::Status(2)));
        assert!(sink.entries().is_empty());
    }
}
