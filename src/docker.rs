//! Docker Engine implementation of [`ContainerRuntime`].

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::models::{ContainerInspectResponse, ContainerSummary, EventMessage};
use bollard::system::EventsOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::DnsError;
use crate::event::Notification;
use crate::runtime::{ContainerRuntime, NotificationStream, WorkloadMetadata};

/// Container runtime backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect according to the runtime configuration.
    ///
    /// This only builds the client; the first request is what actually
    /// reaches the engine.
    pub fn connect(config: &RuntimeConfig) -> Result<Self, DnsError> {
        let docker = match config.docker_host.as_deref() {
            Some(host) if host.starts_with("unix://") => {
                Docker::connect_with_socket(host, config.timeout_secs, API_DEFAULT_VERSION)?
            }
            Some(host) if host.starts_with("tcp://") || host.starts_with("http://") => {
                Docker::connect_with_http(host, config.timeout_secs, API_DEFAULT_VERSION)?
            }
            Some(host) => {
                return Err(DnsError::Config(format!(
                    "unsupported docker_host scheme: {host}"
                )))
            }
            None => Docker::connect_with_local_defaults()?,
        };

        info!(
            docker_host = config.docker_host.as_deref().unwrap_or("local defaults"),
            "Docker client configured"
        );
        Ok(Self { docker })
    }

    /// Wrap an existing client.
    pub fn from_client(docker: Docker) -> Self {
        Self { docker }
    }
}

/// Map a container listing entry to a notification. Entries without an id are dropped.
fn summary_to_notification(summary: ContainerSummary) -> Option<Notification> {
    let id = summary.id?;
    Some(Notification {
        id,
        status: summary.status.unwrap_or_default(),
    })
}

/// Map a container event to a notification. The action (`create`, `start`,
/// `die`, ...) is used as status text.
fn event_to_notification(event: EventMessage) -> Option<Notification> {
    let id = event.actor?.id?;
    Some(Notification {
        id,
        status: event.action.unwrap_or_default(),
    })
}

/// Pull the fields used for naming out of an inspect response.
fn metadata_from_inspect(response: ContainerInspectResponse) -> WorkloadMetadata {
    let config = response.config.unwrap_or_default();
    let ip = response
        .network_settings
        .and_then(|n| n.ip_address)
        .unwrap_or_default();

    WorkloadMetadata {
        hostname: config.hostname.unwrap_or_default(),
        domain: config.domainname.unwrap_or_default(),
        ip,
        env: config.env.unwrap_or_default(),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_running(&self) -> Result<Vec<Notification>, DnsError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| DnsError::RuntimeEnumeration(e.to_string()))?;

        debug!(count = containers.len(), "listed running containers");
        Ok(containers
            .into_iter()
            .filter_map(summary_to_notification)
            .collect())
    }

    async fn subscribe_events(&self) -> Result<NotificationStream, DnsError> {
        let mut filters = HashMap::new();
        filters.insert("type".to_string(), vec!["container".to_string()]);
        let options = EventsOptions::<String> {
            filters,
            ..Default::default()
        };

        let stream = self
            .docker
            .events(Some(options))
            .filter_map(|item| async move {
                match item {
                    Ok(event) => event_to_notification(event).map(Ok),
                    Err(e) => Some(Err(DnsError::from(e))),
                }
            })
            .boxed();

        Ok(stream)
    }

    async fn inspect(&self, id: &str) -> Result<WorkloadMetadata, DnsError> {
        let response = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| DnsError::MetadataUnavailable {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(metadata_from_inspect(response))
    }
}
