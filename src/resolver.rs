//! Derives the names a container should publish from its metadata.
//!
//! Every container gets `<hostname>.<domain>.` pointing at its primary IP.
//! Extra names come from environment overrides:
//!
//! ```text
//! DNS_PUBLISH_NAME_API=api.example.com:10.0.0.5
//!   → api.example.com. → 10.0.0.5
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::DnsError;
use crate::runtime::{ContainerRuntime, WorkloadMetadata};

/// Environment variable prefix marking a name override.
pub const PUBLISH_NAME_PREFIX: &str = "DNS_PUBLISH_NAME_";

/// A fully-qualified name and the address it should resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublishedName {
    /// Fully-qualified name, always ending in `.`.
    pub name: String,
    /// Target address as reported by the runtime.
    pub ip: String,
}

impl PublishedName {
    /// Build a published name from a bare name, appending the trailing dot.
    pub fn new(name: &str, ip: impl Into<String>) -> Self {
        Self {
            name: format!("{name}."),
            ip: ip.into(),
        }
    }
}

impl fmt::Display for PublishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.ip)
    }
}

/// Parse one `KEY=VALUE` environment line into a name override.
///
/// Returns `None` for lines without `=`, keys without the prefix, values
/// without `:` and empty names.
pub fn parse_override(line: &str) -> Option<PublishedName> {
    let (key, value) = line.split_once('=')?;
    if !key.starts_with(PUBLISH_NAME_PREFIX) {
        return None;
    }
    let (name, ip) = value.split_once(':')?;
    if name.is_empty() {
        return None;
    }
    Some(PublishedName::new(name, ip))
}

/// All names for a container: the implicit hostname name first, then overrides
/// in environment order.
pub fn names_from_metadata(meta: &WorkloadMetadata) -> Vec<PublishedName> {
    let implicit = PublishedName::new(&format!("{}.{}", meta.hostname, meta.domain), &meta.ip);

    std::iter::once(implicit)
        .chain(meta.env.iter().filter_map(|line| parse_override(line)))
        .collect()
}

/// Queries the runtime for fresh metadata on every call; nothing is cached.
#[derive(Clone)]
pub struct MetadataResolver {
    runtime: Arc<dyn ContainerRuntime>,
}

impl MetadataResolver {
    /// Create a resolver over the given runtime.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Resolve the names to publish for a container.
    ///
    /// Fails with [`DnsError::MetadataUnavailable`] when the container can no
    /// longer be inspected.
    pub async fn resolve_names(&self, id: &str) -> Result<Vec<PublishedName>, DnsError> {
        let meta = self
            .runtime
            .inspect(id)
            .await
            .map_err(|e| match e {
                e @ DnsError::MetadataUnavailable { .. } => e,
                other => DnsError::MetadataUnavailable {
                    id: id.to_string(),
                    reason: other.to_string(),
                },
            })?;

        Ok(names_from_metadata(&meta))
    }
}
