//! Worker launch command construction.
//!
//! The argument vector is fixed in shape:
//!
//! ```text
//! -Djava.awt.headless=true
//! -Dsolr.solr.home=<dir>
//! -Djetty.port=<port>
//! -cp <dir>/start.jar
//! -Dlog4j.configuration=file:<dir>/log4j.properties
//! -Dsolr.lib.dir=<dir>/lib
//! <extra args...>
//! [three jmxremote flags, only with a diagnostic port]
//! org.eclipse.jetty.start.Main
//! ```
//!
//! The management flags disable authentication and TLS. That is the
//! long-standing behavior for a local diagnostic port and is kept as is;
//! leave `diagnostic_port` unset to keep remote management off.

use crate::config::SupervisorConfig;
use solr_common::{SupervisorError, SupervisorResult};
use solr_process::{resolve_executable, WorkerCommand};
use std::path::Path;
use tracing::debug;

pub const HEADLESS_FLAG: &str = "-Djava.awt.headless=true";
pub const CLASSPATH_FLAG: &str = "-cp";
pub const BOOTSTRAP_ARCHIVE: &str = "start.jar";
pub const LOGGING_CONFIG_FILE: &str = "log4j.properties";
pub const LIBRARY_DIR: &str = "lib";
pub const MAIN_CLASS: &str = "org.eclipse.jetty.start.Main";

/// Builds the [`WorkerCommand`] for a configuration.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    config: &'a SupervisorConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a SupervisorConfig) -> Self {
        Self { config }
    }

    /// The argument vector. Pure: same configuration, same vector.
    pub fn args(&self) -> Vec<String> {
        worker_args(
            &self.config.directory,
            &self.config.listen_port,
            self.config.diagnostic_port.as_deref(),
            &self.config.extra_args,
        )
    }

    /// Resolve the Java executable and assemble the full command.
    ///
    /// Fails with `SpawnFailed` when the executable cannot be found.
    pub fn build(&self) -> SupervisorResult<WorkerCommand> {
        let executable = resolve_executable(&self.config.java_executable)
            .map_err(|e| SupervisorError::spawn_failed(&self.config.id, e.to_string()))?;
        debug!(
            "Resolved {} to {} for {}",
            self.config.java_executable,
            executable.display(),
            self.config.id
        );

        Ok(WorkerCommand::new(executable, self.args())
            .with_working_directory(&self.config.directory))
    }
}

/// Assemble the worker argument vector.
pub fn worker_args(
    directory: &Path,
    listen_port: &str,
    diagnostic_port: Option<&str>,
    extra_args: &[String],
) -> Vec<String> {
    let dir = directory.display();

    let mut args = vec![
        HEADLESS_FLAG.to_string(),
        format!("-Dsolr.solr.home={}", dir),
        format!("-Djetty.port={}", listen_port),
        CLASSPATH_FLAG.to_string(),
        directory.join(BOOTSTRAP_ARCHIVE).display().to_string(),
        format!(
            "-Dlog4j.configuration=file:{}",
            directory.join(LOGGING_CONFIG_FILE).display()
        ),
        format!("-Dsolr.lib.dir={}", directory.join(LIBRARY_DIR).display()),
    ];

    args.extend(extra_args.iter().cloned());

    if let Some(port) = diagnostic_port {
        args.extend(management_args(port));
    }

    args.push(MAIN_CLASS.to_string());
    args
}

fn management_args(port: &str) -> [String; 3] {
    [
        format!("-Dcom.sun.management.jmxremote.port={}", port),
        "-Dcom.sun.management.jmxremote.authenticate=false".to_string(),
        "-Dcom.sun.management.jmxremote.ssl=false".to_string(),
    ]
}
