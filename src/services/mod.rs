//! Concrete workers run by the supervisor.
//!
//! # Data Flow
//! ```text
//! startup.rs
//!     → http.rs (bind listener, serve health/status/metrics)
//!     → grpc.rs (bind listener, serve grpc.health.v1)
//!     → scheduler.rs (periodic jobs)
//!     → health.rs (state-backed health answers for http.rs)
//!
//! Each worker:
//!     run → observe cancellation → drain → report completion
//! ```

pub mod grpc;
pub mod health;
pub mod http;
pub mod scheduler;

use thiserror::Error;

pub use grpc::GrpcWorker;
pub use health::{HealthError, HealthReport, HealthService};
pub use http::{AppState, HttpWorker};
pub use scheduler::{JobError, ScheduledJob, Scheduler};

/// Errors raised while constructing a worker.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}
