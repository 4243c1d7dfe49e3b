//! # Solr Monitoring
//!
//! Readiness checking for the worker supervisor.
//!
//! This crate provides:
//! - [`ReadinessProbe`]: the predicate the supervisor polls during startup
//! - [`ReadinessPoller`]: the bounded one-attempt-per-second retry loop
//! - [`HttpReadinessProbe`]: an HTTP implementation of the predicate
//!
//! The supervisor core only sees the trait; the HTTP probe is wired in by
//! whoever builds the supervisor.

pub mod http;
pub mod readiness;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Health check error types.
#[derive(Error, Debug)]
pub enum HealthCheckError {
    #[error("Health check invalid response: {id} - {response}")]
    InvalidResponse { id: String, response: String },
}

/// Result type for health check operations.
pub type HealthCheckResult<T> = Result<T, HealthCheckError>;

/// Result of a single check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckData {
    pub is_healthy: bool,
    pub checked_at: DateTime<Utc>,
    pub response_time_ms: Option<u64>,
    pub error_message: Option<String>,
}

// Re-export main types
pub use http::{check_http_readiness, HttpReadinessConfig, HttpReadinessProbe};
pub use readiness::{
    wait_until_ready, ReadinessOutcome, ReadinessPoller, ReadinessProbe, READINESS_INTERVAL,
};
