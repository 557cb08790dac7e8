//! Container runtime abstraction.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::DnsError;
use crate::event::Notification;

/// Live feed of lifecycle notifications. Items are yielded in arrival order.
pub type NotificationStream = BoxStream<'static, Result<Notification, DnsError>>;

/// Per-container metadata needed to derive published names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadMetadata {
    /// Container hostname.
    pub hostname: String,
    /// Container domain name (may be empty).
    pub domain: String,
    /// Primary IP address on the default network.
    pub ip: String,
    /// Environment as `KEY=VALUE` lines.
    pub env: Vec<String>,
}

/// Operations the reconciler needs from the container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List currently running containers with their current status text.
    async fn list_running(&self) -> Result<Vec<Notification>, DnsError>;

    /// Subscribe to the live lifecycle event feed.
    ///
    /// Events delivered between subscription and the first poll must be
    /// buffered by the implementation.
    async fn subscribe_events(&self) -> Result<NotificationStream, DnsError>;

    /// Fetch current metadata for a container.
    async fn inspect(&self, id: &str) -> Result<WorkloadMetadata, DnsError>;
}
