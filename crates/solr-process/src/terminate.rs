//! Graceful process termination by OS process id.
//!
//! Closing a [`crate::ProcessHandle`] does not by itself deliver a polite stop
//! request to the worker, so shutdown signals the real OS pid first.

use solr_common::ProcessResult;

/// Send the graceful termination signal (`SIGTERM`) to `pid`.
pub fn terminate_gracefully(pid: u32) -> ProcessResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid).map_err(|_| {
            solr_common::ProcessError::stop_failed(pid.to_string(), "PID out of range")
        })?;
        kill(Pid::from_raw(raw), Signal::SIGTERM)
            .map_err(|e| solr_common::ProcessError::stop_failed(pid.to_string(), e.to_string()))
    }

    #[cfg(not(unix))]
    {
        Err(solr_common::ProcessError::stop_failed(
            pid.to_string(),
            "graceful termination signal is not supported on this platform",
        ))
    }
}
