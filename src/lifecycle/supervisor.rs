//! Top-level orchestration of workers.
//!
//! # State Transitions
//! ```text
//! Starting → Running:      tracker armed, signal listener installed, workers spawned
//! Running → ShuttingDown:  cancellation triggered, or every worker finished on its own
//! ShuttingDown → Exited:   deadline guard resolved (graceful or timeout)
//! ```
//!
//! # Design Decisions
//! - Every fallible setup step runs before the first worker is spawned, so a
//!   setup failure never leaves launched workers behind
//! - Each worker is a tracked `JoinHandle` with its own completion reporter
//! - Cancellation is cooperative; after the grace window the supervisor stops
//!   waiting and aborts whatever is left

use std::fmt;
use std::time::Duration;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::LifecycleConfig;
use crate::lifecycle::completion::{CompletionTracker, WorkerId};
use crate::lifecycle::deadline::{DeadlineGuard, ShutdownOutcome};
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::shutdown::CancellationSource;
use crate::lifecycle::signals::{InterruptSource, OsInterrupts, SignalListener};
use crate::lifecycle::worker::Worker;

/// Supervisor lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Starting,
    Running,
    ShuttingDown,
    Exited,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Exited => "exited",
        };
        f.write_str(name)
    }
}

/// What happened during shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub outcome: ShutdownOutcome,
    /// Time from entering `ShuttingDown` until the deadline guard resolved.
    pub elapsed: Duration,
    /// Workers whose tasks were still running when the grace window expired.
    pub abandoned: Vec<String>,
}

/// A launched worker.
struct WorkerHandle {
    id: WorkerId,
    name: String,
    join: JoinHandle<()>,
}

/// Launches workers and coordinates their shutdown.
pub struct Supervisor {
    config: LifecycleConfig,
    workers: Vec<Box<dyn Worker>>,
    cancel: CancellationSource,
    state_tx: watch::Sender<LifecycleState>,
    interrupts: Option<Box<dyn InterruptSource>>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.workers.iter().map(|w| w.name()).collect();
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("workers", &names)
            .field("state", &*self.state_tx.borrow())
            .finish()
    }
}

impl Supervisor {
    /// Create a supervisor that listens for OS interrupts.
    pub fn new(config: LifecycleConfig) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Starting);
        Self {
            config,
            workers: Vec::new(),
            cancel: CancellationSource::new(),
            state_tx,
            interrupts: None,
        }
    }

    /// Replace the OS interrupt source.
    pub fn with_interrupts(mut self, source: Box<dyn InterruptSource>) -> Self {
        self.interrupts = Some(source);
        self
    }

    /// Add a worker to launch when the supervisor runs.
    pub fn register<W: Worker>(&mut self, worker: W) -> WorkerId {
        let id = WorkerId(self.workers.len());
        tracing::debug!(worker = %worker.name(), %id, "Worker registered");
        self.workers.push(Box::new(worker));
        id
    }

    /// Handle for programmatic shutdown.
    pub fn cancellation(&self) -> CancellationSource {
        self.cancel.clone()
    }

    /// Subscribe to lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Launch every worker and drive them through shutdown.
    pub async fn run(self) -> Result<ShutdownReport, LifecycleError> {
        let Supervisor {
            config,
            workers,
            cancel,
            state_tx,
            interrupts,
        } = self;

        // Starting: everything fallible happens here.
        let tracker = CompletionTracker::new();
        tracker.expect(workers.len())?;

        let source: Box<dyn InterruptSource> = match interrupts {
            Some(source) => source,
            None => Box::new(OsInterrupts {
                include_terminate: config.terminate_on_sigterm,
            }),
        };
        let listener = match SignalListener::arm(source, cancel.clone()) {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "Could not install interrupt handler, no workers launched");
                transition(&state_tx, LifecycleState::Exited);
                return Err(LifecycleError::SignalSetup(e));
            }
        };

        let mut launches = Vec::with_capacity(workers.len());
        for (index, worker) in workers.into_iter().enumerate() {
            let id = WorkerId(index);
            let reporter = tracker.reporter(id, worker.name())?;
            launches.push((id, worker, reporter));
        }

        let mut handles = Vec::with_capacity(launches.len());
        for (id, worker, reporter) in launches {
            let name = worker.name().to_string();
            let join = tokio::spawn(worker.start(cancel.observe(), reporter));
            tracing::debug!(worker = %name, %id, "Worker launched");
            handles.push(WorkerHandle { id, name, join });
        }

        transition(&state_tx, LifecycleState::Running);
        tracing::info!(
            workers = handles.len(),
            grace_window_ms = config.grace_window_ms,
            "Supervisor running"
        );

        let observer = cancel.observe();
        let all_done = tracker.all_done();
        tokio::select! {
            _ = observer.cancelled() => {
                tracing::info!("Shutdown requested, telling workers to stop");
            }
            _ = all_done.wait() => {
                tracing::info!("All workers finished without a shutdown request");
            }
        }

        let shutdown_started = Instant::now();
        transition(&state_tx, LifecycleState::ShuttingDown);
        cancel.trigger();

        let outcome = DeadlineGuard::new(config.grace_window())
            .race(&all_done, shutdown_started)
            .await;
        let elapsed = shutdown_started.elapsed();
        drop(listener);

        let abandoned = settle(handles, outcome).await;
        transition(&state_tx, LifecycleState::Exited);

        Ok(ShutdownReport {
            outcome,
            elapsed,
            abandoned,
        })
    }
}

fn transition(state_tx: &watch::Sender<LifecycleState>, next: LifecycleState) {
    let previous = state_tx.send_replace(next);
    tracing::debug!(from = %previous, to = %next, "Lifecycle transition");
}

/// Join finished worker tasks and abort the rest after a timeout.
async fn settle(handles: Vec<WorkerHandle>, outcome: ShutdownOutcome) -> Vec<String> {
    let mut abandoned = Vec::new();

    for handle in handles {
        if handle.join.is_finished() {
            if let Err(e) = handle.join.await {
                if e.is_panic() {
                    tracing::error!(worker = %handle.name, id = %handle.id, "Worker panicked");
                }
            }
        } else if outcome == ShutdownOutcome::TimeoutKill {
            tracing::warn!(worker = %handle.name, id = %handle.id, "Abandoning worker still running after grace window");
            handle.join.abort();
            abandoned.push(handle.name);
        } else {
            tracing::debug!(worker = %handle.name, id = %handle.id, "Worker reported completion, task still unwinding");
        }
    }

    abandoned
}
