//! # Solr Log Collection
//!
//! Destinations for the merged stdout/stderr lines of the supervised worker.
//!
//! The supervisor hands every captured line to an [`OutputSink`]. Provided
//! sinks:
//! - [`TracingOutputSink`]: re-emits lines as `tracing` events (target `worker`)
//! - [`FileOutputSink`]: appends timestamped lines to a file
//! - [`CircularBufferOutputSink`]: keeps the last N lines in memory

pub mod output;
pub mod types;

// Re-export main types
pub use output::{CircularBufferOutputSink, FileOutputSink, OutputSink, TracingOutputSink};
pub use types::OutputEntry;
