//! Worker contract.
//!
//! A worker runs until it observes cancellation, shuts itself down, and then
//! reports completion exactly once. Everything it depends on is handed to it
//! at construction.

use std::future::Future;
use futures_util::future::{BoxFuture, FutureExt};

use crate::lifecycle::completion::CompletionReporter;
use crate::lifecycle::shutdown::CancellationHandle;

/// A long-running unit of work launched by the supervisor.
pub trait Worker: Send + 'static {
    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    /// Run until cancelled, then call `report.report()` once fully stopped.
    ///
    /// If `report` is dropped instead, that still counts as completion.
    fn start(self: Box<Self>, cancel: CancellationHandle, report: CompletionReporter) -> BoxFuture<'static, ()>;
}

/// Worker built from a closure. See [`worker_fn`].
pub struct FnWorker<F> {
    name: String,
    run: F,
}

impl<F> std::fmt::Debug for FnWorker<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnWorker").field("name", &self.name).finish()
    }
}

/// Adapt a closure into a [`Worker`].
pub fn worker_fn<F, Fut>(name: impl Into<String>, run: F) -> FnWorker<F>
where
    F: FnOnce(CancellationHandle, CompletionReporter) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FnWorker {
        name: name.into(),
        run,
    }
}

impl<F, Fut> Worker for FnWorker<F>
where
    F: FnOnce(CancellationHandle, CompletionReporter) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(self: Box<Self>, cancel: CancellationHandle, report: CompletionReporter) -> BoxFuture<'static, ()> {
        (self.run)(cancel, report).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::completion::{CompletionTracker, WorkerId};
    use crate::lifecycle::shutdown::CancellationSource;

    #[tokio::test]
    async fn test_fn_worker_runs_until_cancelled() {
        let cancel = CancellationSource::new();
        let tracker = CompletionTracker::new();
        tracker.expect(1).unwrap();

        let worker: Box<dyn Worker> = Box::new(worker_fn("echo", |cancel, report| async move {
            cancel.cancelled().await;
            report.report();
        }));
        assert_eq!(worker.name(), "echo");

        let reporter = tracker.reporter(WorkerId(0), worker.name()).unwrap();
        let task = tokio::spawn(worker.start(cancel.observe(), reporter));

        tokio::task::yield_now().await;
        assert_eq!(tracker.completed(), 0);

        cancel.trigger();
        task.await.unwrap();
        assert!(tracker.all_done().is_done());
    }
}
