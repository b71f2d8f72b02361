//! Cooperative cancellation for a conversion run.
//!
//! A [`CancellationToken`] is cheap to clone and can be shared between the
//! caller (e.g. a Ctrl-C handler) and the pipeline. When it fires, the run
//! controller stops awaiting the current stage, which drops the in-flight
//! external process (spawned with `kill_on_drop`), and goes straight to
//! workspace cleanup.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared cancellation flag with an async wait.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
