//! Lifecycle error definitions.

use thiserror::Error;

/// Errors raised while setting up the supervisor.
///
/// None of these occur once workers are running; a shutdown timeout is an
/// outcome, not an error.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `expect` was called twice on the same tracker.
    #[error("completion tracker already armed for {expected} workers")]
    TrackerAlreadyArmed { expected: usize },

    /// A reporter was requested before the tracker knew how many to expect.
    #[error("completion tracker has not been armed")]
    TrackerNotArmed,

    /// More reporters were requested than workers were expected.
    #[error("all {expected} completion reporters have already been issued")]
    TooManyReporters { expected: usize },

    /// Registering with the OS interrupt facility failed.
    #[error("failed to install interrupt handler: {0}")]
    SignalSetup(#[source] std::io::Error),
}
