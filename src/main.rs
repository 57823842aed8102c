use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;

use service_supervisor::config::{self, ConfigOverrides, SupervisorConfig};
use service_supervisor::lifecycle::startup;
use service_supervisor::observability::logging;
use service_supervisor::ShutdownOutcome;

#[derive(Parser)]
#[command(name = "service-supervisor", version)]
#[command(about = "Runs HTTP, gRPC and scheduler workers with coordinated graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "SUPERVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level (ignored when RUST_LOG is set).
    #[arg(short, long)]
    verbose: bool,

    /// Override lifecycle.grace_window_ms.
    #[arg(long)]
    grace_window_ms: Option<u64>,

    /// Override http.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override grpc.bind_address.
    #[arg(long)]
    grpc_bind: Option<String>,
}

fn load(cli: &Cli) -> Result<SupervisorConfig, config::ConfigError> {
    let overrides = ConfigOverrides {
        grace_window_ms: cli.grace_window_ms,
        http_bind_address: cli.bind.clone(),
        grpc_bind_address: cli.grpc_bind.clone(),
    };
    config::resolve_config(cli.config.as_deref(), &overrides)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so `.env` can supply SUPERVISOR_CONFIG and RUST_LOG.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability, cli.verbose) {
        eprintln!("Could not initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        Err(e) => tracing::warn!(error = %e, "No .env file loaded"),
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        grace_window_ms = config.lifecycle.grace_window_ms,
        http_enabled = config.http.enabled,
        grpc_enabled = config.grpc.enabled,
        scheduler_enabled = config.scheduler.enabled,
        "service-supervisor starting"
    );

    let boot = match startup::bootstrap(&config).await {
        Ok(boot) => boot,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let report = match boot.supervisor.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Supervisor failed to start");
            return ExitCode::FAILURE;
        }
    };

    match report.outcome {
        ShutdownOutcome::GracefulExit => {
            tracing::info!(elapsed_ms = report.elapsed.as_millis() as u64, "Shutdown complete");
            ExitCode::SUCCESS
        }
        ShutdownOutcome::TimeoutKill => {
            tracing::warn!(
                abandoned = ?report.abandoned,
                "Graceful timeout exceeded, killing the process"
            );
            // Skip runtime teardown; abandoned workers may never yield.
            std::process::exit(report.outcome.exit_code(config.lifecycle.forced_exit_code));
        }
    }
}
