use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use solr_log_collection::{FileOutputSink, OutputSink, TracingOutputSink};
use solr_monitoring::HttpReadinessProbe;
use solr_supervisor::config::validation::parse_port;
use solr_supervisor::{OutputConfig, OutputTarget, StopReason, Supervisor, SupervisorFileConfig};

/// Solr supervisor daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Worker listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Run duration in seconds (for testing)
    #[arg(long)]
    run_duration: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.debug)?;

    info!("Starting Solr supervisor");
    info!("Config file: {}", args.config);

    let mut config = SupervisorFileConfig::load_from_file(&args.config)?;

    if let Some(port) = args.port {
        config.supervisor.listen_port = port.to_string();
        config.validate()?;
    }

    let listen_port = parse_port("listen_port", &config.supervisor.listen_port)?;
    let probe = HttpReadinessProbe::new(config.readiness.to_http_config(listen_port));
    info!("Readiness endpoint: {}", probe.config().endpoint);

    let sink = create_output_sink(&config.output)?;

    let supervisor = Supervisor::start(config.supervisor, Arc::new(probe), sink)
        .await
        .map_err(|e| {
            error!("Failed to start worker: {}", e);
            anyhow!("Start failed: {}", e)
        })?;

    info!(
        "Worker {} ready (PID: {:?})",
        supervisor.id(),
        supervisor.get_process_id().await
    );

    let run_for = async {
        match args.run_duration {
            Some(duration) => {
                info!("Running for {} seconds (test mode)", duration);
                tokio::time::sleep(tokio::time::Duration::from_secs(duration)).await;
                Ok(())
            }
            None => wait_for_shutdown_signal().await,
        }
    };

    tokio::select! {
        result = run_for => {
            result?;
            info!("Shutting down worker...");
            supervisor
                .shutdown()
                .await
                .map_err(|e| anyhow!("Shutdown failed: {}", e))?;
            supervisor
                .wait_for_exit()
                .await
                .map_err(|e| anyhow!("Shutdown failed: {}", e))?;
            info!("Worker shut down successfully");
        }
        reason = supervisor.stopped() => {
            let reason = reason.map_err(|e| anyhow!("Supervisor failed: {}", e))?;
            report_stop(&reason)?;
        }
    }

    Ok(())
}

fn report_stop(reason: &StopReason) -> Result<()> {
    if reason.is_failure() {
        error!("Worker stopped: {}", reason);
        return Err(anyhow!("Worker stopped: {}", reason));
    }
    warn!("Worker stopped on its own: {}", reason);
    Ok(())
}

fn create_output_sink(output: &OutputConfig) -> Result<Arc<dyn OutputSink>> {
    match output.target {
        OutputTarget::Tracing => Ok(Arc::new(TracingOutputSink)),
        OutputTarget::File => {
            let path = output
                .path
                .clone()
                .ok_or_else(|| anyhow!("File output target must specify a path"))?;
            info!("Writing worker output to {}", path.display());
            let sink = FileOutputSink::new(path).context("Failed to open worker output file")?;
            Ok(Arc::new(sink))
        }
    }
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")?;
        info!("Received Ctrl+C signal");
    }

    Ok(())
}
