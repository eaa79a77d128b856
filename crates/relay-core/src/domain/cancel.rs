//! Cooperative cancellation.
//!
//! The mediator only threads the token through to handlers. It never cancels, polls or
//! times out on its own.

use tokio::sync::watch;

/// Read side of a cancellation signal. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    // None = never cancelled
    rx: Option<watch::Receiver<bool>>,
}

impl CancellationToken {
    /// A token that is never cancelled.
    pub fn none() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the source cancels.
    ///
    /// Pends forever for `none()` tokens and for sources dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // source dropped without cancelling
                return std::future::pending().await;
            }
        }
    }
}

/// Write side: owned by whoever decides deadlines (a request scope, a shutdown hook, ...).
#[derive(Debug)]
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn cancel(&self) {
        // send_replace: succeeds even with no live receivers
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}
