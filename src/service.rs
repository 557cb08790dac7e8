//! Service setup and lifecycle management.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::cache::RecordCache;
use crate::config::Config;
use crate::docker::DockerRuntime;
use crate::driver::FeedDriver;
use crate::error::DnsError;
use crate::publisher::NamePublisher;
use crate::reconciler::Reconciler;
use crate::resolver::MetadataResolver;
use crate::runtime::ContainerRuntime;
use crate::shutdown::Shutdown;

/// Periodically emit cache metrics.
async fn metrics_loop(cache: RecordCache, interval: Duration, mut shutdown: Shutdown) {
    let mut interval = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                cache.emit_metrics();
                debug!(
                    records = cache.len(),
                    serial = cache.serial(),
                    "emitted cache metrics"
                );
            }
            _ = shutdown.wait() => {
                debug!("metrics loop shutting down");
                return;
            }
        }
    }
}

/// Keeps a [`RecordCache`] in sync with the containers on one host.
pub struct ContainerDns {
    config: Config,
    cache: RecordCache,
}

impl ContainerDns {
    /// Create a service with an empty cache.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: RecordCache::new(),
        }
    }

    /// The record cache this service publishes into. Clones share storage,
    /// so a DNS frontend can read from it while the service runs.
    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Connect to Docker and run until shutdown or until the event feed closes.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), DnsError> {
        let runtime = DockerRuntime::connect(&self.config.runtime)?;
        self.run_with_runtime(Arc::new(runtime), shutdown).await
    }

    /// Run against an arbitrary runtime.
    ///
    /// Fails only if the startup listing or the event subscription fails.
    pub async fn run_with_runtime(
        self,
        runtime: Arc<dyn ContainerRuntime>,
        shutdown: Shutdown,
    ) -> Result<(), DnsError> {
        info!("Starting container-dns");

        let resolver = MetadataResolver::new(runtime.clone());
        let publisher = NamePublisher::new(Arc::new(self.cache.clone()));
        let reconciler = Reconciler::new(resolver, publisher);
        let mut driver = FeedDriver::new(runtime, reconciler);

        if shutdown.is_shutting_down() {
            info!("Shutdown requested before startup reconciliation");
            return Ok(());
        }

        driver.startup_pass().await?;
        info!(records = self.cache.len(), "Initial records published");
        self.cache.emit_metrics();

        let worker = driver.spawn(shutdown.clone()).await?;

        let metrics_handle = tokio::spawn(metrics_loop(
            self.cache.clone(),
            Duration::from_secs(self.config.telemetry.metrics_interval_secs.max(1)),
            shutdown,
        ));

        match worker.await {
            Ok(reconciler) => {
                info!(
                    tracked = reconciler.tracked_count(),
                    records = self.cache.len(),
                    "Event feed worker stopped"
                );
            }
            Err(e) => {
                error!("Event feed worker panicked: {}", e);
            }
        }

        metrics_handle.abort();
        let _ = metrics_handle.await;
        self.cache.emit_metrics();

        info!("container-dns stopped");
        Ok(())
    }
}
