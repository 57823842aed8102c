//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Construct workers → Bind listeners
//!
//! Run (supervisor.rs):
//!     Arm completion tracker → Install signal listener → Spawn workers
//!
//! Shutdown (shutdown.rs, signals.rs, completion.rs, deadline.rs):
//!     SIGINT or cancel() → Cancellation broadcast → Workers drain and report
//!         → All done? graceful exit : grace window expires → forced exit
//! ```
//!
//! # Design Decisions
//! - All workers start concurrently; there is no ordering between them
//! - Workers are never retried or restarted
//! - Shutdown has timeout: forced exit after deadline

pub mod completion;
pub mod deadline;
pub mod error;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;
pub mod worker;

pub use completion::{AllDone, CompletionReporter, CompletionTracker, WorkerId};
pub use deadline::{race_completion_against_timeout, DeadlineGuard, ShutdownOutcome};
pub use error::LifecycleError;
pub use shutdown::{CancellationHandle, CancellationSource};
pub use signals::{Interrupt, InterruptSender, InterruptSource, ManualInterrupts, OsInterrupts, SignalListener};
pub use supervisor::{LifecycleState, ShutdownReport, Supervisor};
pub use worker::{worker_fn, FnWorker, Worker};
