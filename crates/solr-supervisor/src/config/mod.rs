use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solr_monitoring::HttpReadinessConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod validation;

/// Top-level configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorFileConfig {
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub readiness: ReadinessCheckConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Everything needed to launch and supervise one worker.
///
/// Immutable once handed to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Worker home directory (`start.jar`, `lib/`, `log4j.properties`).
    pub directory: PathBuf,

    /// Port the worker listens on, passed through as text.
    pub listen_port: String,

    /// Remote management port. Management stays disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_port: Option<String>,

    /// Extra VM arguments, passed in order after the fixed flags.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Readiness attempts, one per second, before giving up.
    #[serde(default = "default_startup_wait_attempts")]
    pub startup_wait_attempts: u32,

    #[serde(default = "default_java_executable")]
    pub java_executable: String,

    /// Identifier used in log records.
    #[serde(default = "default_worker_id")]
    pub id: String,

    /// How long a closed worker may take to exit before it is killed.
    #[serde(default = "default_grace_period", with = "duration_serde")]
    pub grace_period: Duration,
}

impl SupervisorConfig {
    pub fn new(directory: impl Into<PathBuf>, listen_port: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            listen_port: listen_port.into(),
            diagnostic_port: None,
            extra_args: Vec::new(),
            startup_wait_attempts: default_startup_wait_attempts(),
            java_executable: default_java_executable(),
            id: default_worker_id(),
            grace_period: default_grace_period(),
        }
    }

    pub fn with_diagnostic_port(mut self, port: impl Into<String>) -> Self {
        self.diagnostic_port = Some(port.into());
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn with_startup_wait_attempts(mut self, attempts: u32) -> Self {
        self.startup_wait_attempts = attempts;
        self
    }

    pub fn with_java_executable(mut self, executable: impl Into<String>) -> Self {
        self.java_executable = executable.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Validate the supervisor section
    pub fn validate(&self) -> Result<()> {
        validation::validate_supervisor_config(self)
    }
}

/// HTTP readiness probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessCheckConfig {
    #[serde(default = "default_readiness_host")]
    pub host: String,
    #[serde(default = "default_readiness_path")]
    pub path: String,
    #[serde(default = "default_readiness_timeout", with = "duration_serde")]
    pub timeout: Duration,
    #[serde(default = "default_expected_status")]
    pub expected_status: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_body: Option<String>,
}

impl Default for ReadinessCheckConfig {
    fn default() -> Self {
        Self {
            host: default_readiness_host(),
            path: default_readiness_path(),
            timeout: default_readiness_timeout(),
            expected_status: default_expected_status(),
            expected_body: None,
        }
    }
}

impl ReadinessCheckConfig {
    /// Probe settings for a worker listening on `port`.
    pub fn to_http_config(&self, port: u16) -> HttpReadinessConfig {
        let mut config = HttpReadinessConfig::for_worker(&self.host, port, &self.path)
            .with_timeout(self.timeout)
            .with_expected_status(self.expected_status.clone());
        if let Some(ref body) = self.expected_body {
            config = config.with_expected_body(body.clone());
        }
        config
    }
}

/// Where captured worker output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    #[default]
    Tracing,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub target: OutputTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SupervisorFileConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: SupervisorFileConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

// Default value functions
fn default_startup_wait_attempts() -> u32 {
    30
}

fn default_java_executable() -> String {
    "java".to_string()
}

fn default_worker_id() -> String {
    "solr".to_string()
}

fn default_grace_period() -> Duration {
    solr_process::DEFAULT_GRACE_PERIOD
}

fn default_readiness_host() -> String {
    "127.0.0.1".to_string()
}

fn default_readiness_path() -> String {
    "/solr/admin/ping".to_string()
}

fn default_readiness_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_expected_status() -> Vec<u16> {
    vec![200]
}

// Durations are written as "500ms", "10s" or "1m"
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let invalid = || format!("Invalid duration: {}", s);

        // "ms" must be checked before "s"
        if let Some(num) = s.strip_suffix("ms") {
            num.parse().map(Duration::from_millis).map_err(|_| invalid())
        } else if let Some(num) = s.strip_suffix('s') {
            num.parse().map(Duration::from_secs).map_err(|_| invalid())
        } else if let Some(num) = s.strip_suffix('m') {
            let mins: u64 = num.parse().map_err(|_| invalid())?;
            mins.checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(invalid)
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}
