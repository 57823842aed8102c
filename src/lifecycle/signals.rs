//! OS signal handling.
//!
//! # Responsibilities
//! - Register interrupt handlers before any worker starts
//! - Translate interrupts into a cancellation trigger
//! - Keep listening during shutdown so repeated Ctrl-C is harmless
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Registration is synchronous and fallible; delivery is a stream
//! - Repeated interrupts are no-ops; there is no escalation path
//! - SIGTERM is opt-in; SIGINT / Ctrl-C is always handled

use std::fmt;
use std::io;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::CancellationSource;

/// What asked the process to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// SIGINT or Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Delivered through [`ManualInterrupts`].
    Manual,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Interrupt => f.write_str("SIGINT"),
            Interrupt::Terminate => f.write_str("SIGTERM"),
            Interrupt::Manual => f.write_str("manual"),
        }
    }
}

/// A provider of interrupt notifications.
pub trait InterruptSource: Send + 'static {
    /// Register with the provider and return the notification stream.
    fn install(self: Box<Self>) -> io::Result<BoxStream<'static, Interrupt>>;
}

/// Interrupts delivered by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsInterrupts {
    /// Also treat SIGTERM as a shutdown request (Unix only).
    pub include_terminate: bool,
}

impl InterruptSource for OsInterrupts {
    #[cfg(unix)]
    fn install(self: Box<Self>) -> io::Result<BoxStream<'static, Interrupt>> {
        use tokio::signal::unix::{signal, SignalKind};

        let sigint = signal(SignalKind::interrupt())?;
        let sigterm = if self.include_terminate {
            Some(signal(SignalKind::terminate())?)
        } else {
            None
        };

        let interrupts = stream::unfold(sigint, |mut sigint| async move {
            sigint.recv().await.map(|()| (Interrupt::Interrupt, sigint))
        });

        match sigterm {
            Some(sigterm) => {
                let terminates = stream::unfold(sigterm, |mut sigterm| async move {
                    sigterm.recv().await.map(|()| (Interrupt::Terminate, sigterm))
                });
                Ok(stream::select(interrupts, terminates).boxed())
            }
            None => Ok(interrupts.boxed()),
        }
    }

    #[cfg(not(unix))]
    fn install(self: Box<Self>) -> io::Result<BoxStream<'static, Interrupt>> {
        Ok(stream::unfold((), |()| async {
            tokio::signal::ctrl_c().await.ok().map(|()| (Interrupt::Interrupt, ()))
        })
        .boxed())
    }
}

/// Programmatic interrupt source.
#[derive(Debug)]
pub struct ManualInterrupts {
    rx: mpsc::UnboundedReceiver<Interrupt>,
}

impl ManualInterrupts {
    /// Create the source and the sender that feeds it.
    pub fn new() -> (Self, InterruptSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, InterruptSender { tx })
    }
}

impl InterruptSource for ManualInterrupts {
    fn install(self: Box<Self>) -> io::Result<BoxStream<'static, Interrupt>> {
        Ok(stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|interrupt| (interrupt, rx))
        })
        .boxed())
    }
}

/// Sending half of [`ManualInterrupts`].
#[derive(Debug, Clone)]
pub struct InterruptSender {
    tx: mpsc::UnboundedSender<Interrupt>,
}

impl InterruptSender {
    /// Deliver an interrupt. Returns `false` if the listener is gone.
    pub fn send(&self, interrupt: Interrupt) -> bool {
        self.tx.send(interrupt).is_ok()
    }
}

/// Background task turning interrupts into cancellation.
///
/// The task is aborted when the listener is dropped.
#[derive(Debug)]
pub struct SignalListener {
    task: JoinHandle<()>,
}

impl SignalListener {
    /// Install `source` and start listening. Does not block.
    pub fn arm(source: Box<dyn InterruptSource>, cancel: CancellationSource) -> io::Result<Self> {
        let mut interrupts = source.install()?;

        let task = tokio::spawn(async move {
            while let Some(interrupt) = interrupts.next().await {
                if cancel.trigger() {
                    tracing::info!(signal = %interrupt, "Received interrupt, attempting graceful shutdown");
                } else {
                    tracing::info!(signal = %interrupt, "Shutdown already in progress, ignoring interrupt");
                }
            }
            tracing::debug!("Interrupt stream ended");
        });

        tracing::debug!("Signal listener armed");
        Ok(Self { task })
    }

    /// Whether the listener task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}
