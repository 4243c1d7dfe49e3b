// HTTP readiness probe

use crate::readiness::ReadinessProbe;
use crate::{HealthCheckData, HealthCheckError, HealthCheckResult};
use async_trait::async_trait;
use chrono::Utc;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// HTTP readiness check configuration
#[derive(Debug, Clone)]
pub struct HttpReadinessConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub expected_status: Vec<u16>,
    pub expected_body: Option<String>,
}

impl Default for HttpReadinessConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout: Duration::from_secs(2),
            expected_status: vec![200],
            expected_body: None,
        }
    }
}

impl HttpReadinessConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Ping endpoint of a worker listening on `host:port`.
    pub fn for_worker(host: &str, port: u16, path: &str) -> Self {
        let path = path.trim_start_matches('/');
        Self::new(format!("http://{}:{}/{}", host, port, path))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_expected_status(mut self, status_codes: Vec<u16>) -> Self {
        self.expected_status = status_codes;
        self
    }

    pub fn with_expected_body(mut self, body: impl Into<String>) -> Self {
        self.expected_body = Some(body.into());
        self
    }
}

/// Issue one GET against the configured endpoint.
///
/// Connection failures and timeouts come back as unhealthy data, not errors:
/// during startup a refused connection is the normal "not yet" answer.
pub async fn check_http_readiness(
    config: &HttpReadinessConfig,
) -> HealthCheckResult<HealthCheckData> {
    let start_time = std::time::Instant::now();

    let uri: Uri = config
        .endpoint
        .parse()
        .map_err(|e| HealthCheckError::InvalidResponse {
            id: config.endpoint.clone(),
            response: format!("Invalid URI: {}", e),
        })?;

    let client = Client::builder(TokioExecutor::new()).build_http();

    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("User-Agent", "solr-supervisor/0.1")
        .body(Empty::<Bytes>::new())
        .map_err(|e| HealthCheckError::InvalidResponse {
            id: config.endpoint.clone(),
            response: format!("Failed to build request: {}", e),
        })?;

    let response = match timeout(config.timeout, client.request(request)).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            debug!("Readiness request failed: {} - {}", config.endpoint, e);
            return Ok(unhealthy(
                start_time.elapsed().as_millis() as u64,
                format!("Connection failed: {}", e),
            ));
        }
        Err(_) => {
            debug!("Readiness request timed out: {}", config.endpoint);
            return Ok(unhealthy(
                config.timeout.as_millis() as u64,
                "Timeout".to_string(),
            ));
        }
    };

    let status = response.status();
    let elapsed = start_time.elapsed().as_millis() as u64;
    let status_ok = config.expected_status.contains(&status.as_u16());

    if !status_ok {
        return Ok(unhealthy(
            elapsed,
            format!("Unexpected status code: {}", status),
        ));
    }

    if let Some(ref expected) = config.expected_body {
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| HealthCheckError::InvalidResponse {
                id: config.endpoint.clone(),
                response: format!("Failed to read body: {}", e),
            })?
            .to_bytes();

        let body_str = String::from_utf8_lossy(&body_bytes);
        if !body_str.contains(expected.as_str()) {
            debug!(
                "Readiness body mismatch: {} (expected '{}', got '{}')",
                config.endpoint, expected, body_str
            );
            return Ok(unhealthy(
                elapsed,
                format!("Body does not contain '{}'", expected),
            ));
        }
    }

    debug!(
        "Readiness check passed: {} - status={} time={}ms",
        config.endpoint, status, elapsed
    );

    Ok(HealthCheckData {
        is_healthy: true,
        checked_at: Utc::now(),
        response_time_ms: Some(elapsed),
        error_message: None,
    })
}

fn unhealthy(elapsed_ms: u64, message: String) -> HealthCheckData {
    HealthCheckData {
        is_healthy: false,
        checked_at: Utc::now(),
        response_time_ms: Some(elapsed_ms),
        error_message: Some(message),
    }
}

/// [`ReadinessProbe`] backed by an HTTP endpoint on the worker.
#[derive(Debug, Clone)]
pub struct HttpReadinessProbe {
    config: HttpReadinessConfig,
}

impl HttpReadinessProbe {
    pub fn new(config: HttpReadinessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HttpReadinessConfig {
        &self.config
    }
}

#[async_trait]
impl ReadinessProbe for HttpReadinessProbe {
    async fn probe(&self) -> HealthCheckResult<bool> {
        let data = check_http_readiness(&self.config).await?;
        if let Some(message) = data.error_message {
            debug!("{} not ready: {}", self.config.endpoint, message);
        }
        Ok(data.is_healthy)
    }
}
