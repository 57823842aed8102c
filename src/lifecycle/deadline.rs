//! Shutdown deadline enforcement.
//!
//! Once cancellation is triggered, completion races a fixed grace window.
//! Whichever resolves first decides how the process exits.

use std::fmt;
use std::time::Duration;
use serde::Serialize;
use tokio::time::{self, Instant};

use crate::lifecycle::completion::AllDone;
use crate::observability::metrics;

/// Result of the completion-vs-deadline race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownOutcome {
    /// Every worker reported within the grace window.
    GracefulExit,
    /// The grace window elapsed first; remaining workers are abandoned.
    TimeoutKill,
}

impl ShutdownOutcome {
    pub fn is_graceful(&self) -> bool {
        matches!(self, ShutdownOutcome::GracefulExit)
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self, forced_code: i32) -> i32 {
        match self {
            ShutdownOutcome::GracefulExit => 0,
            ShutdownOutcome::TimeoutKill => forced_code,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownOutcome::GracefulExit => "graceful_exit",
            ShutdownOutcome::TimeoutKill => "timeout_kill",
        }
    }
}

impl fmt::Display for ShutdownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Race the all-done signal against `window`.
pub async fn race_completion_against_timeout(all_done: &AllDone, window: Duration) -> ShutdownOutcome {
    match time::timeout(window, all_done.wait()).await {
        Ok(()) => ShutdownOutcome::GracefulExit,
        Err(_) => ShutdownOutcome::TimeoutKill,
    }
}

/// Grace-window guard used by the supervisor.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineGuard {
    window: Duration,
}

impl DeadlineGuard {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run the race, measuring from `started`.
    ///
    /// Call only after cancellation has been triggered.
    pub async fn race(&self, all_done: &AllDone, started: Instant) -> ShutdownOutcome {
        let outcome = race_completion_against_timeout(all_done, self.window).await;
        let elapsed = started.elapsed();

        match outcome {
            ShutdownOutcome::GracefulExit => {
                tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Workers exited within grace window"
                );
            }
            ShutdownOutcome::TimeoutKill => {
                tracing::warn!(
                    grace_window_ms = self.window.as_millis() as u64,
                    "Grace window exceeded, forcing termination"
                );
            }
        }

        metrics::record_shutdown(outcome, elapsed);
        outcome
    }
}
