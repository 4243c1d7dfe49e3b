use super::*;
use anyhow::{anyhow, Result};

/// Validate the complete configuration
pub fn validate_config(config: &SupervisorFileConfig) -> Result<()> {
    validate_supervisor_config(&config.supervisor)?;
    validate_readiness_config(&config.readiness)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validate the supervisor section
pub fn validate_supervisor_config(config: &SupervisorConfig) -> Result<()> {
    validate_worker_id(&config.id)?;

    if config.directory.as_os_str().is_empty() {
        return Err(anyhow!("Worker directory cannot be empty"));
    }

    let listen_port = parse_port("listen_port", &config.listen_port)?;

    if let Some(ref diagnostic_port) = config.diagnostic_port {
        let diagnostic_port = parse_port("diagnostic_port", diagnostic_port)?;
        if diagnostic_port == listen_port {
            return Err(anyhow!(
                "diagnostic_port must differ from listen_port, both are {}",
                listen_port
            ));
        }
    }

    if config.java_executable.trim().is_empty() {
        return Err(anyhow!("java_executable cannot be empty"));
    }

    if config.startup_wait_attempts == 0 {
        return Err(anyhow!("startup_wait_attempts must be greater than 0"));
    }

    if config.grace_period.is_zero() {
        return Err(anyhow!("grace_period must be greater than 0"));
    }

    Ok(())
}

fn validate_worker_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(anyhow!("Worker ID cannot be empty"));
    }

    if id.len() > 64 {
        return Err(anyhow!("Worker ID too long (max 64 characters): {}", id));
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(anyhow!(
            "Worker ID can only contain alphanumeric characters, hyphens, and underscores: {}",
            id
        ));
    }

    Ok(())
}

/// Parse a port given as text, rejecting 0.
pub fn parse_port(field: &str, value: &str) -> Result<u16> {
    let port: u16 = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("{} must be a number between 1 and 65535, got: {}", field, value))?;

    if port == 0 {
        return Err(anyhow!("{} must be between 1 and 65535, got: 0", field));
    }

    Ok(port)
}

fn validate_readiness_config(readiness: &ReadinessCheckConfig) -> Result<()> {
    if readiness.host.is_empty() {
        return Err(anyhow!("Readiness host cannot be empty"));
    }

    if readiness.timeout.is_zero() {
        return Err(anyhow!("Readiness timeout must be greater than 0"));
    }

    if readiness.timeout > Duration::from_secs(60) {
        return Err(anyhow!(
            "Readiness timeout must not exceed 60s, got: {:?}",
            readiness.timeout
        ));
    }

    if readiness.expected_status.is_empty() {
        return Err(anyhow!("Readiness expected_status cannot be empty"));
    }

    if let Some(code) = readiness
        .expected_status
        .iter()
        .find(|code| !(100..=599).contains(*code))
    {
        return Err(anyhow!("Invalid HTTP status code: {}", code));
    }

    Ok(())
}

fn validate_output_config(output: &OutputConfig) -> Result<()> {
    match output.target {
        OutputTarget::File => {
            if output.path.is_none() {
                return Err(anyhow!("File output target must specify a path"));
            }
        }
        OutputTarget::Tracing => {}
    }
    Ok(())
}
