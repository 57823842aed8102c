//! Periodic job scheduler.
//!
//! # Responsibilities
//! - Run each named job on its own interval
//! - Stop ticking on cancellation, letting an in-flight run finish
//! - Report completion once every job loop has exited
//!
//! # Design Decisions
//! - Job failures are logged and counted, never retried
//! - Missed ticks are delayed rather than bursted
//! - An idle scheduler (no jobs) still lives until shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::config::SchedulerConfig;
use crate::lifecycle::{CancellationHandle, CompletionReporter, Worker};
use crate::observability::metrics;

/// A failed job run.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct JobError(pub String);

type JobFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// A named job and how often it runs.
#[derive(Clone)]
pub struct ScheduledJob {
    name: String,
    every: Duration,
    run: JobFn,
}

impl std::fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("name", &self.name)
            .field("every", &self.every)
            .finish()
    }
}

impl ScheduledJob {
    /// Create a job. The first run happens one interval after start.
    ///
    /// # Panics
    ///
    /// Panics if `every` is zero. Config-built jobs are rejected earlier by
    /// validation.
    pub fn new<F, Fut>(name: impl Into<String>, every: Duration, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let name = name.into();
        assert!(!every.is_zero(), "job `{name}` must have a non-zero period");
        Self {
            name,
            every,
            run: Arc::new(move || run().boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Job that logs process uptime.
pub fn heartbeat(every: Duration) -> ScheduledJob {
    let started_at = Instant::now();
    ScheduledJob::new("heartbeat", every, move || async move {
        tracing::info!(uptime_secs = started_at.elapsed().as_secs(), "Scheduler heartbeat");
        Ok(())
    })
}

/// Scheduler worker.
#[derive(Debug, Default)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler with the built-in jobs enabled by `config`.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new().job(heartbeat(Duration::from_secs(config.heartbeat_interval_secs)))
    }

    /// Add a job.
    pub fn job(mut self, job: ScheduledJob) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Worker for Scheduler {
    fn name(&self) -> &str {
        "scheduler"
    }

    fn start(self: Box<Self>, cancel: CancellationHandle, report: CompletionReporter) -> BoxFuture<'static, ()> {
        async move {
            tracing::info!(jobs = self.jobs.len(), "Scheduler starting");

            if self.jobs.is_empty() {
                cancel.cancelled().await;
            }

            let mut loops = JoinSet::new();
            for job in self.jobs {
                loops.spawn(run_job(job, cancel.clone()));
            }

            while let Some(result) = loops.join_next().await {
                if let Err(e) = result {
                    if e.is_panic() {
                        tracing::error!("Scheduled job panicked");
                    }
                }
            }

            tracing::info!("Scheduler stopped");
            report.report();
        }
        .boxed()
    }
}

async fn run_job(job: ScheduledJob, cancel: CancellationHandle) {
    let mut ticker = time::interval_at(time::Instant::now() + job.every, job.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let success = match (job.run)().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(job = %job.name, error = %e, "Scheduled job failed");
                        false
                    }
                };
                metrics::record_job_run(&job.name, success);
            }
        }
    }

    tracing::debug!(job = %job.name, "Job loop exited");
}
