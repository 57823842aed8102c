//! Shared utilities for supervisor integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use futures_util::stream::BoxStream;
use service_supervisor::config::LifecycleConfig;
use service_supervisor::lifecycle::{Interrupt, InterruptSender, InterruptSource, ManualInterrupts};
use service_supervisor::{worker_fn, Supervisor, Worker};

/// Supervisor with the given grace window and a manual interrupt source.
pub fn supervisor(grace_window_ms: u64) -> (Supervisor, InterruptSender) {
    let config = LifecycleConfig {
        grace_window_ms,
        ..LifecycleConfig::default()
    };
    let (source, sender) = ManualInterrupts::new();
    (Supervisor::new(config).with_interrupts(Box::new(source)), sender)
}

/// Worker that stops `drain` after cancellation and then reports.
pub fn draining(name: &str, drain: Duration) -> impl Worker {
    worker_fn(name, move |cancel, report| async move {
        cancel.cancelled().await;
        tokio::time::sleep(drain).await;
        report.report();
    })
}

/// Worker that ignores cancellation and never reports.
pub fn stuck(name: &str) -> impl Worker {
    worker_fn(name, |_cancel, report| async move {
        let _never = report;
        std::future::pending::<()>().await;
    })
}

/// Worker that records whether it was ever started.
pub fn recording(name: &str, started: Arc<AtomicBool>) -> impl Worker {
    worker_fn(name, move |cancel, report| async move {
        started.store(true, Ordering::SeqCst);
        cancel.cancelled().await;
        report.report();
    })
}

/// Interrupt source whose registration always fails.
pub struct FailingInterrupts;

impl InterruptSource for FailingInterrupts {
    fn install(self: Box<Self>) -> io::Result<BoxStream<'static, Interrupt>> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "signals unavailable"))
    }
}
