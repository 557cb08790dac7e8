//! Writes and removes name records in the resolution cache.

use hickory_proto::rr::Name;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{ResolutionCache, ResolutionRecord};
use crate::error::DnsError;
use crate::metrics;
use crate::resolver::PublishedName;

/// Compute the reverse-zone name for an address, e.g. `10.0.0.5` →
/// `5.0.0.10.in-addr.arpa.`.
pub fn reverse_key(ip: &str) -> Result<String, DnsError> {
    let addr: IpAddr = ip.parse().map_err(|e: std::net::AddrParseError| {
        DnsError::ReverseKeyUnavailable {
            ip: ip.to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut name = Name::from(addr);
    name.set_fqdn(true);
    Ok(name.to_ascii())
}

/// Publishes and withdraws names.
#[derive(Clone)]
pub struct NamePublisher {
    cache: Arc<dyn ResolutionCache>,
}

impl NamePublisher {
    /// Create a publisher writing into the given cache.
    pub fn new(cache: Arc<dyn ResolutionCache>) -> Self {
        Self { cache }
    }

    /// Store a record for the name. A failed reverse-key computation is logged
    /// and the record is stored with an empty reverse key.
    pub fn publish(&self, name: &PublishedName) {
        let reverse = match reverse_key(&name.ip) {
            Ok(key) => key,
            Err(e) => {
                warn!(
                    name = %name.name,
                    error = %e,
                    "Unable to create reverse lookup name, PTR lookups unavailable for this record"
                );
                metrics::record_reverse_key_failure();
                String::new()
            }
        };

        info!(name = %name.name, ip = %name.ip, "Adding record");
        self.cache.set(
            &name.name,
            ResolutionRecord {
                ip: name.ip.clone(),
                reverse_key: reverse,
                name: name.name.clone(),
            },
        );
        metrics::record_published();
    }

    /// Remove the record for the name. Returns false when no record was
    /// stored under it.
    pub fn withdraw(&self, name: &PublishedName) -> bool {
        info!(name = %name.name, ip = %name.ip, "Removing record");
        let removed = self.cache.remove(&name.name);
        if removed {
            metrics::record_withdrawn();
        } else {
            debug!(name = %name.name, "No record to remove");
        }
        removed
    }
}
