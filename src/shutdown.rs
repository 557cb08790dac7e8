//! Graceful shutdown signalling.

use tokio::sync::watch;
use tracing::{info, warn};

/// Cloneable handle observed by long-running tasks.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Flips every [`Shutdown`] handle created alongside it.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a handle and its trigger.
    pub fn new() -> (Self, ShutdownTrigger) {
        let (tx, rx) = watch::channel(false);
        (Self { rx }, ShutdownTrigger { tx })
    }

    /// Create a handle that fires on Ctrl-C, plus the future that waits for
    /// the signal. The future must be spawned.
    pub fn new_signals() -> (Self, impl std::future::Future<Output = ()> + Send + 'static) {
        let (shutdown, trigger) = Self::new();
        (shutdown, trigger.on_ctrl_c())
    }

    /// True once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is requested. Never completes if the trigger is
    /// dropped without firing.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl ShutdownTrigger {
    /// Request shutdown.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    async fn on_ctrl_c(self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                self.trigger();
            }
            Err(e) => {
                warn!("Unable to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let (shutdown, trigger) = Shutdown::new();
        let mut waiter = shutdown.clone();
        assert!(!shutdown.is_shutting_down());

        let handle = tokio::spawn(async move { waiter.wait().await });
        trigger.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter did not wake")
            .unwrap();
        assert!(shutdown.is_shutting_down());
    }

    #[tokio::test]
    async fn test_dropped_trigger_never_fires() {
        let (mut shutdown, trigger) = Shutdown::new();
        drop(trigger);

        let result = tokio::time::timeout(Duration::from_millis(50), shutdown.wait()).await;
        assert!(result.is_err());
        assert!(!shutdown.is_shutting_down());
    }
}
