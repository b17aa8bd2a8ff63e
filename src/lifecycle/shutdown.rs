//! Shutdown coordination.

use std::sync::Arc;

use tokio::sync::watch;

/// Latched stop flag shared by the server and its background tasks.
///
/// Once triggered it stays triggered: a [`ShutdownSignal`] taken afterwards
/// resolves immediately.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Handed to each task that must stop on shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered.
    pub async fn recv(mut self) {
        // An error means every `Shutdown` was dropped; treat it as a stop.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn every_clone_observes_trigger() {
        let shutdown = Shutdown::new();
        let a = shutdown.signal();
        let b = a.clone();

        let waiters = tokio::spawn(async move { tokio::join!(a.recv(), b.recv()) });
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiters)
            .await
            .unwrap()
            .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn signal_taken_after_trigger_resolves() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), shutdown.signal().recv())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pending_until_triggered() {
        let shutdown = Shutdown::new();
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.signal().recv()).await;
        assert!(waited.is_err());
        assert!(!shutdown.is_triggered());
    }
}
