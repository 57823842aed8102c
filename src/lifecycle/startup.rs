//! Startup orchestration.
//!
//! # Responsibilities
//! - Install process-wide collaborators (metrics recorder)
//! - Construct every enabled worker with its dependencies injected
//! - Bind listeners so address conflicts fail before anything launches
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Nothing is spawned here; launching is left to `Supervisor::run`

use std::net::SocketAddr;
use metrics_exporter_prometheus::{BuildError, PrometheusHandle};
use thiserror::Error;

use crate::config::SupervisorConfig;
use crate::lifecycle::supervisor::Supervisor;
use crate::observability::metrics;
use crate::services::{AppState, GrpcWorker, HealthService, HttpWorker, Scheduler, ServiceError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] BuildError),
}

/// A supervisor ready to run.
#[derive(Debug)]
pub struct Bootstrapped {
    pub supervisor: Supervisor,
    /// Bound HTTP address, when the HTTP worker is enabled.
    pub http_addr: Option<SocketAddr>,
    /// Bound gRPC address, when the gRPC worker is enabled.
    pub grpc_addr: Option<SocketAddr>,
}

/// Install the metrics recorder (if enabled) and assemble the supervisor.
pub async fn bootstrap(config: &SupervisorConfig) -> Result<Bootstrapped, StartupError> {
    let handle = if config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };
    assemble(config, handle).await
}

/// Build the supervisor and its workers from `config`.
pub async fn assemble(
    config: &SupervisorConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<Bootstrapped, StartupError> {
    let mut supervisor = Supervisor::new(config.lifecycle.clone());
    let mut http_addr = None;
    let mut grpc_addr = None;

    if config.http.enabled {
        let state = AppState {
            health: HealthService::new(supervisor.state()),
            metrics,
        };
        let worker = HttpWorker::bind(&config.http, state).await?;
        http_addr = Some(worker.local_addr());
        supervisor.register(worker);
    } else {
        tracing::info!("HTTP worker disabled");
    }

    if config.grpc.enabled {
        let worker = GrpcWorker::bind(&config.grpc).await?;
        grpc_addr = Some(worker.local_addr());
        supervisor.register(worker);
    } else {
        tracing::info!("gRPC worker disabled");
    }

    if config.scheduler.enabled {
        supervisor.register(Scheduler::from_config(&config.scheduler));
    } else {
        tracing::info!("Scheduler disabled");
    }

    tracing::info!(workers = supervisor.worker_count(), "Startup complete");
    Ok(Bootstrapped {
        supervisor,
        http_addr,
        grpc_addr,
    })
}
