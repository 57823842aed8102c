//! Shutdown coordination for the supervisor.
//!
//! # Responsibilities
//! - Hold the single process-wide cancellation flag
//! - Hand out read-only observers to every worker
//! - Flip Active → Cancelled exactly once, no matter how many callers race
//!
//! # Design Decisions
//! - Backed by a `watch` channel rather than `broadcast`: the latest value is
//!   retained, so an observer that subscribes after the trigger still sees it
//! - Triggering never blocks on observers

use std::sync::Arc;
use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Cloning is cheap; all clones share the same flag.
#[derive(Clone, Debug)]
pub struct CancellationSource {
    /// `false` while active, `true` once cancelled.
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationSource {
    /// Create a new, active cancellation source.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Get an observation handle for a worker.
    pub fn observe(&self) -> CancellationHandle {
        CancellationHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger cancellation.
    ///
    /// Returns `true` for the one call that performed the transition and
    /// `false` for every other call.
    pub fn trigger(&self) -> bool {
        let transitioned = self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        });

        if transitioned {
            tracing::debug!(observers = self.tx.receiver_count(), "Cancellation triggered");
        }
        transitioned
    }

    /// Whether cancellation has been triggered.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of live observation handles.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`CancellationSource`].
#[derive(Clone, Debug)]
pub struct CancellationHandle {
    rx: watch::Receiver<bool>,
}

impl CancellationHandle {
    /// Whether cancellation has been triggered.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancellation is triggered.
    ///
    /// Resolves immediately if it already was. Never resolves if the source
    /// is dropped without triggering.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
        if result.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_source_is_active() {
        let source = CancellationSource::new();
        assert!(!source.is_cancelled());
        assert!(!source.observe().is_cancelled());
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let source = CancellationSource::new();
        assert!(source.trigger());
        assert!(!source.trigger());
        assert!(!source.trigger());
        assert!(source.is_cancelled());
    }

    #[test]
    fn test_trigger_without_observers() {
        let source = CancellationSource::new();
        assert_eq!(source.observer_count(), 0);
        assert!(source.trigger());
        assert!(source.is_cancelled());
    }

    #[tokio::test]
    async fn test_late_observer_sees_cancellation() {
        let source = CancellationSource::new();
        source.trigger();

        let handle = source.observe();
        assert!(handle.is_cancelled());
        tokio::time::timeout(Duration::from_millis(100), handle.cancelled())
            .await
            .expect("late observer should resolve immediately");
    }

    #[tokio::test]
    async fn test_observers_wake_on_trigger() {
        let source = CancellationSource::new();
        let mut waiters = Vec::new();
        for _ in 0..16 {
            let handle = source.observe();
            waiters.push(tokio::spawn(async move { handle.cancelled().await }));
        }

        tokio::task::yield_now().await;
        source.trigger();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("observer did not wake")
                .unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_triggers_transition_once() {
        let source = CancellationSource::new();
        let mut tasks = Vec::new();
        for _ in 0..64 {
            let source = source.clone();
            tasks.push(tokio::spawn(async move { source.trigger() }));
        }

        let mut transitions = 0;
        for task in tasks {
            if task.await.unwrap() {
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert!(source.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_source_never_cancels() {
        let handle = {
            let source = CancellationSource::new();
            source.observe()
        };

        let waited = tokio::time::timeout(Duration::from_secs(60), handle.cancelled()).await;
        assert!(waited.is_err());
        assert!(!handle.is_cancelled());
    }
}
