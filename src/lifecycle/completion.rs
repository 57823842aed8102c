//! Completion tracking for launched workers.
//!
//! # Responsibilities
//! - Know how many workers were launched
//! - Count completion reports without lost updates
//! - Publish "all done" exactly once, never early
//!
//! # Design Decisions
//! - Reporters are issued, not shared: at most `expected` exist, and each is
//!   consumed by `report`, so completions cannot exceed the expected count
//! - Dropping an unreported reporter counts as its report; a panicking or
//!   aborted worker is treated like one that stopped cleanly
//! - The all-done flag lives in a `watch` channel so waiters that arrive late
//!   still observe it

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

use crate::lifecycle::error::LifecycleError;
use crate::observability::metrics;

/// Identifier assigned to a worker at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

#[derive(Debug)]
struct TrackerInner {
    expected: OnceLock<usize>,
    issued: AtomicUsize,
    completed: AtomicUsize,
    done_tx: watch::Sender<bool>,
}

impl TrackerInner {
    /// Count one completion; true if it fired all-done.
    fn report_done(&self, worker: WorkerId, name: &str) -> bool {
        // Reporters only exist after arming.
        let Some(&expected) = self.expected.get() else {
            return false;
        };

        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(completed <= expected, "more completions than workers");

        metrics::record_worker_reported(name);
        tracing::debug!(
            worker = %name,
            id = %worker,
            completed,
            expected,
            "Worker reported completion"
        );

        if completed != expected {
            return false;
        }

        let fired = self.done_tx.send_if_modified(|done| !std::mem::replace(done, true));
        if fired {
            tracing::debug!(expected, "All workers have finished");
        }
        fired
    }
}

/// Aggregate barrier over every launched worker.
#[derive(Clone, Debug)]
pub struct CompletionTracker {
    inner: Arc<TrackerInner>,
}

impl CompletionTracker {
    /// Create an un-armed tracker.
    pub fn new() -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(TrackerInner {
                expected: OnceLock::new(),
                issued: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                done_tx,
            }),
        }
    }

    /// Arm the tracker with the number of workers it will wait for.
    ///
    /// Zero workers counts as done immediately.
    pub fn expect(&self, n: usize) -> Result<(), LifecycleError> {
        self.inner.expected.set(n).map_err(|_| LifecycleError::TrackerAlreadyArmed {
            expected: self.expected().unwrap_or_default(),
        })?;

        if n == 0 {
            self.inner.done_tx.send_replace(true);
        }
        Ok(())
    }

    /// Issue the completion reporter for one worker.
    pub fn reporter(&self, worker: WorkerId, name: &str) -> Result<CompletionReporter, LifecycleError> {
        let expected = self.expected().ok_or(LifecycleError::TrackerNotArmed)?;

        self.inner
            .issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |issued| {
                (issued < expected).then_some(issued + 1)
            })
            .map_err(|_| LifecycleError::TooManyReporters { expected })?;

        Ok(CompletionReporter {
            inner: Some(self.inner.clone()),
            worker,
            name: name.to_string(),
        })
    }

    /// Get a waitable view of the all-done signal.
    pub fn all_done(&self) -> AllDone {
        AllDone {
            rx: self.inner.done_tx.subscribe(),
        }
    }

    /// Expected worker count, once armed.
    pub fn expected(&self) -> Option<usize> {
        self.inner.expected.get().copied()
    }

    /// Number of workers that have reported.
    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::Acquire)
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// One worker's obligation to report that it stopped.
#[derive(Debug)]
pub struct CompletionReporter {
    inner: Option<Arc<TrackerInner>>,
    worker: WorkerId,
    name: String,
}

impl CompletionReporter {
    /// Report that the worker has fully stopped.
    ///
    /// Returns true for the one report that completed the set.
    pub fn report(mut self) -> bool {
        self.report_once()
    }

    /// Identifier of the worker holding this reporter.
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    fn report_once(&mut self) -> bool {
        match self.inner.take() {
            Some(inner) => inner.report_done(self.worker, &self.name),
            None => false,
        }
    }
}

impl Drop for CompletionReporter {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::debug!(worker = %self.name, "Completion reporter dropped without explicit report");
            self.report_once();
        }
    }
}

/// Waitable all-done signal.
#[derive(Clone, Debug)]
pub struct AllDone {
    rx: watch::Receiver<bool>,
}

impl AllDone {
    /// Whether every expected worker has reported.
    pub fn is_done(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until every expected worker has reported.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(|done| *done).await.map(|_| ());
        if result.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn armed(n: usize) -> CompletionTracker {
        let tracker = CompletionTracker::new();
        tracker.expect(n).unwrap();
        tracker
    }

    #[test]
    fn test_zero_workers_done_immediately() {
        let tracker = armed(0);
        assert!(tracker.all_done().is_done());
    }

    #[test]
    fn test_unarmed_tracker_is_not_done() {
        let tracker = CompletionTracker::new();
        assert!(!tracker.all_done().is_done());
        assert!(matches!(
            tracker.reporter(WorkerId(0), "w"),
            Err(LifecycleError::TrackerNotArmed)
        ));
    }

    #[test]
    fn test_expect_only_once() {
        let tracker = armed(2);
        assert!(matches!(
            tracker.expect(3),
            Err(LifecycleError::TrackerAlreadyArmed { expected: 2 })
        ));
        assert_eq!(tracker.expected(), Some(2));
    }

    #[test]
    fn test_not_done_until_last_report() {
        let tracker = armed(3);
        let all_done = tracker.all_done();
        let reporters: Vec<_> = (0..3)
            .map(|i| tracker.reporter(WorkerId(i), "w").unwrap())
            .collect();

        let mut reporters = reporters.into_iter();
        assert!(!reporters.next().unwrap().report());
        assert!(!reporters.next().unwrap().report());
        assert!(!all_done.is_done());
        assert_eq!(tracker.completed(), 2);

        assert!(reporters.next().unwrap().report());
        assert!(all_done.is_done());
        assert_eq!(tracker.completed(), 3);
    }

    #[test]
    fn test_reporters_are_capped() {
        let tracker = armed(1);
        let _first = tracker.reporter(WorkerId(0), "a").unwrap();
        assert!(matches!(
            tracker.reporter(WorkerId(1), "b"),
            Err(LifecycleError::TooManyReporters { expected: 1 })
        ));
    }

    #[test]
    fn test_dropped_reporter_counts() {
        let tracker = armed(1);
        let reporter = tracker.reporter(WorkerId(0), "w").unwrap();
        drop(reporter);
        assert!(tracker.all_done().is_done());
        assert_eq!(tracker.completed(), 1);
    }

    #[tokio::test]
    async fn test_panicking_worker_still_reports() {
        let tracker = armed(1);
        let reporter = tracker.reporter(WorkerId(0), "w").unwrap();

        let task = tokio::spawn(async move {
            let _reporter = reporter;
            panic!("worker blew up");
        });
        assert!(task.await.is_err());

        tokio::time::timeout(Duration::from_secs(1), tracker.all_done().wait())
            .await
            .expect("all done after panic");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reports() {
        let n = 200;
        let tracker = armed(n);
        let all_done = tracker.all_done();

        let tasks: Vec<_> = (0..n)
            .map(|i| {
                let reporter = tracker.reporter(WorkerId(i), "w").unwrap();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    reporter.report()
                })
            })
            .collect();

        let mut fired = 0;
        for task in tasks {
            if task.await.unwrap() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1, "all-done must fire exactly once");

        tokio::time::timeout(Duration::from_secs(1), all_done.wait())
            .await
            .expect("all done");
        assert_eq!(tracker.completed(), n);
    }

    #[test]
    fn test_all_done_publishes_once() {
        let tracker = armed(2);
        let mut rx = tracker.inner.done_tx.subscribe();
        let first = tracker.reporter(WorkerId(0), "a").unwrap();
        let second = tracker.reporter(WorkerId(1), "b").unwrap();

        first.report();
        assert!(!rx.has_changed().unwrap());

        second.report();
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_worker_id_display() {
        assert_eq!(WorkerId(7).to_string(), "worker-7");
    }
}
