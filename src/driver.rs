//! Drives the reconciler from the runtime.
//!
//! Startup runs one synchronous pass over the containers that are already
//! running, then the live event feed is drained by a single spawned task that
//! owns the [`Reconciler`] until the feed closes or shutdown is requested.

use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::DnsError;
use crate::metrics;
use crate::reconciler::Reconciler;
use crate::runtime::{ContainerRuntime, NotificationStream};
use crate::shutdown::Shutdown;

/// Feeds runtime notifications into a [`Reconciler`].
pub struct FeedDriver {
    runtime: Arc<dyn ContainerRuntime>,
    reconciler: Reconciler,
}

impl FeedDriver {
    /// Create a driver.
    pub fn new(runtime: Arc<dyn ContainerRuntime>, reconciler: Reconciler) -> Self {
        Self {
            runtime,
            reconciler,
        }
    }

    /// The reconciler, before it is handed to the worker.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Reconcile every running container once, in listing order.
    ///
    /// Returns the number of containers listed. A listing failure is
    /// [`DnsError::RuntimeEnumeration`] and must be treated as fatal.
    pub async fn startup_pass(&mut self) -> Result<usize, DnsError> {
        let running = self.runtime.list_running().await.map_err(|e| match e {
            e @ DnsError::RuntimeEnumeration(_) => e,
            other => DnsError::RuntimeEnumeration(other.to_string()),
        })?;

        for notification in &running {
            self.reconciler.handle(notification).await;
        }

        metrics::record_startup_reconciled(running.len());
        info!(
            running = running.len(),
            tracked = self.reconciler.tracked_count(),
            "Startup reconciliation complete"
        );
        Ok(running.len())
    }

    /// Subscribe to the live feed and hand the reconciler to a dedicated
    /// worker. The handle resolves to the reconciler once the worker stops.
    pub async fn spawn(self, shutdown: Shutdown) -> Result<JoinHandle<Reconciler>, DnsError> {
        let stream = self.runtime.subscribe_events().await?;
        info!("Subscribed to container events");
        Ok(tokio::spawn(drain(self.reconciler, stream, shutdown)))
    }

    /// Startup pass followed by [`FeedDriver::spawn`].
    pub async fn run(mut self, shutdown: Shutdown) -> Result<JoinHandle<Reconciler>, DnsError> {
        self.startup_pass().await?;
        self.spawn(shutdown).await
    }
}

/// Process notifications strictly one at a time in arrival order.
async fn drain(
    mut reconciler: Reconciler,
    mut stream: NotificationStream,
    mut shutdown: Shutdown,
) -> Reconciler {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.wait() => {
                info!("Event feed worker received shutdown signal");
                break;
            }

            item = stream.next() => {
                match item {
                    Some(Ok(notification)) => {
                        reconciler.handle(&notification).await;
                    }
                    Some(Err(e)) => {
                        warn!("Container event feed error: {}", e);
                        metrics::record_feed_error();
                    }
                    None => {
                        info!("Container event feed closed");
                        break;
                    }
                }
            }
        }
    }

    debug!(tracked = reconciler.tracked_count(), "event feed worker stopped");
    reconciler
}
