//! Service Supervisor Library
//!
//! Runs independent long-lived workers in one process and shuts them down
//! together: one cancellation broadcast, one completion barrier, and a hard
//! grace window after which the process exits regardless.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod services;

pub use config::schema::SupervisorConfig;
pub use lifecycle::{
    worker_fn, CancellationHandle, CancellationSource, CompletionReporter, ShutdownOutcome,
    ShutdownReport, Supervisor, Worker,
};
