//! # Solr Supervisor
//!
//! Starts a Java search-engine worker (Jetty `start.jar`), waits until it
//! answers a readiness probe, and watches it until it is shut down or dies.
//!
//! ```no_run
//! use solr_log_collection::TracingOutputSink;
//! use solr_monitoring::{HttpReadinessConfig, HttpReadinessProbe};
//! use solr_supervisor::{Supervisor, SupervisorConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> solr_common::SupervisorResult<()> {
//! let config = SupervisorConfig::new("/data/core1", "8983");
//! let probe = HttpReadinessProbe::new(HttpReadinessConfig::for_worker(
//!     "127.0.0.1",
//!     8983,
//!     "/solr/admin/ping",
//! ));
//!
//! let supervisor = Supervisor::start(config, Arc::new(probe), Arc::new(TracingOutputSink)).await?;
//! println!("worker pid: {:?}", supervisor.get_process_id().await);
//! supervisor.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod exit_monitor;
pub mod supervisor;

// Re-export main types
pub use command::{worker_args, CommandBuilder};
pub use config::{
    OutputConfig, OutputTarget, ReadinessCheckConfig, SupervisorConfig, SupervisorFileConfig,
};
pub use exit_monitor::{classify, ExitMonitor, ExitVerdict};
pub use solr_common::{ExitCause, StopReason, SupervisorError, SupervisorResult};
pub use solr_process_state::SupervisorPhase;
pub use supervisor::{Supervisor, SupervisorInfo};
