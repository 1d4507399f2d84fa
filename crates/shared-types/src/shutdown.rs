//! # Shutdown Signal
//!
//! Explicit cancellation passed into every loop and blocking call. Observers
//! poll [`ShutdownSignal::is_shutdown`] at iteration boundaries and race I/O
//! against [`ShutdownSignal::cancelled`].

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

/// Owner side of the shutdown channel. Triggering is idempotent.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Observer side of the shutdown channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    /// Signal shutdown to every observer.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// A fresh observer of this trigger.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// True once shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when shutdown is requested. Pending forever if the trigger is
    /// dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run `fut` unless shutdown arrives first; `None` means it was abandoned.
    pub async fn run_until<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Sleep for `duration`; returns `false` if interrupted by shutdown.
    pub async fn sleep(&self, duration: Duration) -> bool {
        self.run_until(tokio::time::sleep(duration)).await.is_some()
    }
}
