//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define supervisor metrics (worker reports, shutdown outcomes, job runs)
//! - Install the Prometheus recorder rendered by `GET /metrics`
//!
//! # Metrics
//! - `supervisor_workers_reported_total` (counter): completion reports by worker
//! - `supervisor_shutdowns_total` (counter): shutdowns by outcome
//! - `supervisor_shutdown_duration_seconds` (histogram): cancellation to resolution
//! - `scheduler_job_runs_total` (counter): job runs by job, result
//! - `http_health_checks_total` (counter): health checks by status
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so tests and
//!   embedders need not install one

use std::time::Duration;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::lifecycle::ShutdownOutcome;

/// Install the global Prometheus recorder.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

pub fn record_worker_reported(worker: &str) {
    counter!("supervisor_workers_reported_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_shutdown(outcome: ShutdownOutcome, elapsed: Duration) {
    counter!("supervisor_shutdowns_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("supervisor_shutdown_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_job_run(job: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("scheduler_job_runs_total", "job" => job.to_string(), "result" => result).increment(1);
}

pub fn record_health_check(healthy: bool) {
    let status = if healthy { "healthy" } else { "unavailable" };
    counter!("http_health_checks_total", "status" => status).increment(1);
}
