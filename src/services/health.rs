//! Health checking.
//!
//! # Responsibilities
//! - Report healthy only while the supervisor is running
//! - Tell load balancers to drain once shutdown begins

use std::time::Instant;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::lifecycle::LifecycleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HealthError {
    #[error("service is still starting")]
    NotReady,

    #[error("service is shutting down")]
    Draining,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub state: LifecycleState,
    pub uptime_secs: u64,
    pub version: &'static str,
}

/// Health service backed by the supervisor's lifecycle state.
#[derive(Debug, Clone)]
pub struct HealthService {
    state: watch::Receiver<LifecycleState>,
    started_at: Instant,
}

impl HealthService {
    pub fn new(state: watch::Receiver<LifecycleState>) -> Self {
        Self {
            state,
            started_at: Instant::now(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn check(&self) -> Result<HealthReport, HealthError> {
        let state = self.state();
        match state {
            LifecycleState::Starting => Err(HealthError::NotReady),
            LifecycleState::ShuttingDown | LifecycleState::Exited => Err(HealthError::Draining),
            LifecycleState::Running => Ok(HealthReport {
                status: "ok",
                state,
                uptime_secs: self.started_at.elapsed().as_secs(),
                version: env!("CARGO_PKG_VERSION"),
            }),
        }
    }
}
