//! Startup readiness polling.
//!
//! The poller owns a countdown of attempts. Each iteration evaluates the
//! probe once; a positive answer ends the wait, anything else (including a
//! probe error) sleeps [`READINESS_INTERVAL`] and tries again until the
//! countdown reaches zero.

use crate::HealthCheckResult;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed delay between readiness attempts.
pub const READINESS_INTERVAL: Duration = Duration::from_secs(1);

/// Asks the worker whether it is accepting requests.
///
/// `Ok(false)` and `Err(_)` are treated the same by the poller: not ready yet.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn probe(&self) -> HealthCheckResult<bool>;
}

#[async_trait]
impl<F> ReadinessProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    async fn probe(&self) -> HealthCheckResult<bool> {
        Ok(self())
    }
}

/// Terminal result of a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// The probe succeeded on attempt number `attempts`.
    Ready { attempts: u32 },
    /// The probe never succeeded within the `attempts` budget.
    TimedOut { attempts: u32 },
}

impl ReadinessOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessOutcome::Ready { .. })
    }
}

/// Bounded readiness wait for one worker.
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    worker_id: String,
    max_attempts: u32,
}

impl ReadinessPoller {
    pub fn new(worker_id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            worker_id: worker_id.into(),
            max_attempts,
        }
    }

    /// Poll `probe` until it reports ready or the attempt budget runs out.
    ///
    /// Probe calls are strictly sequential.
    pub async fn wait_until_ready(&self, probe: &dyn ReadinessProbe) -> ReadinessOutcome {
        let mut last_failure: Option<String> = None;
        let mut remaining = self.max_attempts;

        info!(
            "Waiting for {} to become ready (up to {} attempts, {:?} apart)",
            self.worker_id, self.max_attempts, READINESS_INTERVAL
        );

        loop {
            if remaining == 0 {
                warn!(
                    "{} not ready after {} attempts (last failure: {})",
                    self.worker_id,
                    self.max_attempts,
                    last_failure.as_deref().unwrap_or("none")
                );
                return ReadinessOutcome::TimedOut {
                    attempts: self.max_attempts,
                };
            }

            let attempt = self.max_attempts - remaining + 1;
            match probe.probe().await {
                Ok(true) => {
                    info!("{} is ready after {} attempt(s)", self.worker_id, attempt);
                    return ReadinessOutcome::Ready { attempts: attempt };
                }
                Ok(false) => {
                    debug!("{} not ready yet (attempt {})", self.worker_id, attempt);
                    last_failure = Some("not ready".to_string());
                }
                Err(e) => {
                    debug!(
                        "Readiness probe for {} failed (attempt {}): {}",
                        self.worker_id, attempt, e
                    );
                    last_failure = Some(e.to_string());
                }
            }

            tokio::time::sleep(READINESS_INTERVAL).await;
            remaining -= 1;
        }
    }
}

/// Convenience wrapper around [`ReadinessPoller::wait_until_ready`].
pub async fn wait_until_ready(probe: &dyn ReadinessProbe, max_attempts: u32) -> ReadinessOutcome {
    ReadinessPoller::new("worker", max_attempts)
        .wait_until_ready(probe)
        .await
}
