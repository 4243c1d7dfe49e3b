//! # Solr Process
//!
//! Low-level process operations for the worker supervisor.
//!
//! This crate provides:
//! - [`ProcessHandle`]: exclusive ownership of one spawned child process
//! - [`ExitEvent`]: the asynchronous output/exit notifications it produces
//! - Graceful termination by pid (`SIGTERM`)
//! - Process existence checks
//! - Executable resolution on the search path

pub mod check;
pub mod events;
pub mod execute;
pub mod terminate;
pub mod validation;

// Re-export main types
pub use check::*;
pub use events::{exit_event_from_status, ExitEvent, KillReason};
pub use execute::{ProcessHandle, WorkerCommand, DEFAULT_GRACE_PERIOD};
pub use terminate::*;
pub use validation::*;
