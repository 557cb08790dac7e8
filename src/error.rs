//! Error types for container-dns.

use thiserror::Error;

/// Errors that can occur while reconciling containers with the record cache.
#[derive(Debug, Error)]
pub enum DnsError {
    /// Metadata for a container could not be fetched (usually because it is gone).
    #[error("metadata unavailable for container {id}: {reason}")]
    MetadataUnavailable {
        /// Container identifier.
        id: String,
        /// Underlying failure.
        reason: String,
    },

    /// An IP could not be turned into a reverse-zone name.
    #[error("reverse lookup key unavailable for {ip:?}: {reason}")]
    ReverseKeyUnavailable {
        /// The address as reported by the runtime.
        ip: String,
        /// Why it could not be converted.
        reason: String,
    },

    /// Listing the running containers at startup failed.
    #[error("unable to enumerate running containers: {0}")]
    RuntimeEnumeration(String),

    /// Docker Engine API error.
    #[error("container runtime error: {0}")]
    Runtime(#[from] bollard::errors::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error (signals, sockets)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
