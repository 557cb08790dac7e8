//! Container DNS - keeps DNS records in sync with containers on a Docker host.
//!
//! This crate watches the lifecycle of containers and publishes names for
//! them into a record cache while they run. When a container starts (or is
//! reported `Up`), its names are published; when it dies, they are withdrawn.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         container-dns                            │
//! │                                                                  │
//! │  ┌──────────────┐   ┌────────────┐   ┌──────────────────┐        │
//! │  │ Docker       │──▶│ FeedDriver │──▶│ Reconciler       │        │
//! │  │ (list/events)│   │ (1 worker) │   │ (tracked map)    │        │
//! │  └──────┬───────┘   └────────────┘   └───┬──────────┬───┘        │
//! │         │ inspect                        │          │            │
//! │         │                                ▼          ▼            │
//! │         │                  ┌──────────────────┐ ┌─────────────┐  │
//! │         └─────────────────▶│ MetadataResolver │ │NamePublisher│  │
//! │                            └──────────────────┘ └──────┬──────┘  │
//! │                                                        ▼         │
//! │                                               ┌──────────────┐   │
//! │                                               │ RecordCache  │   │
//! │                                               └──────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Published names
//!
//! ```text
//! hostname=web, domain=docker, ip=172.17.0.2
//!   → web.docker.          → 172.17.0.2
//! DNS_PUBLISH_NAME_API=api.example.com:10.0.0.5
//!   → api.example.com.     → 10.0.0.5
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use container_dns::{Config, ContainerDns, Shutdown};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (shutdown, signals) = Shutdown::new_signals();
//!     tokio::spawn(signals);
//!
//!     let service = ContainerDns::new(Config::default());
//!     let cache = service.cache().clone();
//!     tokio::spawn(service.run(shutdown));
//!
//!     // Readers share the cache the service keeps current.
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     println!("{:?}", cache.lookup("web.docker."));
//! }
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod docker;
pub mod driver;
pub mod error;
pub mod event;
pub mod metrics;
pub mod publisher;
pub mod reconciler;
pub mod resolver;
pub mod runtime;
pub mod service;
pub mod shutdown;
pub mod telemetry;

// Re-export main types
pub use cache::{RecordCache, ResolutionCache, ResolutionRecord};
pub use config::{Config, RuntimeConfig, TelemetryConfig};
pub use driver::FeedDriver;
pub use error::DnsError;
pub use event::{Notification, NotificationKind};
pub use metrics::TransitionOutcome;
pub use reconciler::{Reconciler, TrackedWorkload, Transition};
pub use resolver::{MetadataResolver, PublishedName};
pub use runtime::{ContainerRuntime, WorkloadMetadata};
pub use service::ContainerDns;
pub use shutdown::Shutdown;
