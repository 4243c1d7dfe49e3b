//! # Solr Common
//!
//! Error taxonomy and small domain types shared by every crate in the
//! supervisor workspace.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{ProcessError, ProcessResult, SupervisorError, SupervisorResult};
pub use types::{ExitCause, StopReason};
