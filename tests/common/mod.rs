//! Shared test infrastructure: a scripted container runtime.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use container_dns::cache::RecordCache;
use container_dns::publisher::NamePublisher;
use container_dns::runtime::NotificationStream;
use container_dns::{
    ContainerRuntime, DnsError, MetadataResolver, Notification, Reconciler, TransitionOutcome,
    WorkloadMetadata,
};

// --- Constants ---

pub const DOMAIN: &str = "docker";

// --- FakeRuntime ---

/// One scripted item on the live feed.
#[derive(Debug, Clone)]
pub enum FeedItem {
    Event(Notification),
    Error(String),
}

#[derive(Default)]
struct FakeState {
    metadata: HashMap<String, WorkloadMetadata>,
    running: Vec<Notification>,
    feed: Vec<FeedItem>,
    keep_feed_open: bool,
    fail_listing: bool,
    inspect_calls: Vec<String>,
    calls: Vec<&'static str>,
}

/// In-memory `ContainerRuntime` whose metadata can change between calls.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the metadata `inspect` returns for a container.
    pub fn set_metadata(&self, id: &str, meta: WorkloadMetadata) {
        self.state.lock().metadata.insert(id.to_string(), meta);
    }

    /// Make `inspect` fail for a container.
    pub fn remove_metadata(&self, id: &str) {
        self.state.lock().metadata.remove(id);
    }

    /// Add a container to the startup listing.
    pub fn add_running(&self, id: &str, status: &str) {
        self.state.lock().running.push(Notification::new(id, status));
    }

    /// Append an event to the live feed.
    pub fn push_event(&self, id: &str, status: &str) {
        self.state
            .lock()
            .feed
            .push(FeedItem::Event(Notification::new(id, status)));
    }

    /// Append an error item to the live feed.
    pub fn push_feed_error(&self, msg: &str) {
        self.state.lock().feed.push(FeedItem::Error(msg.to_string()));
    }

    /// Keep the feed open after the scripted items instead of ending it.
    pub fn keep_feed_open(&self) {
        self.state.lock().keep_feed_open = true;
    }

    /// Make the startup listing fail.
    pub fn fail_listing(&self) {
        self.state.lock().fail_listing = true;
    }

    /// Container ids passed to `inspect`, in call order.
    pub fn inspect_calls(&self) -> Vec<String> {
        self.state.lock().inspect_calls.clone()
    }

    /// Runtime operations in call order ("list", "subscribe", "inspect").
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_running(&self) -> Result<Vec<Notification>, DnsError> {
        let mut state = self.state.lock();
        state.calls.push("list");
        if state.fail_listing {
            return Err(DnsError::RuntimeEnumeration(
                "connection refused".to_string(),
            ));
        }
        Ok(state.running.clone())
    }

    async fn subscribe_events(&self) -> Result<NotificationStream, DnsError> {
        let mut state = self.state.lock();
        state.calls.push("subscribe");

        let items: Vec<Result<Notification, DnsError>> = state
            .feed
            .drain(..)
            .map(|item| match item {
                FeedItem::Event(n) => Ok(n),
                FeedItem::Error(msg) => Err(DnsError::Io(io::Error::new(io::ErrorKind::Other, msg))),
            })
            .collect();

        let feed = stream::iter(items);
        if state.keep_feed_open {
            Ok(feed.chain(stream::pending()).boxed())
        } else {
            Ok(feed.boxed())
        }
    }

    async fn inspect(&self, id: &str) -> Result<WorkloadMetadata, DnsError> {
        let mut state = self.state.lock();
        state.calls.push("inspect");
        state.inspect_calls.push(id.to_string());
        state
            .metadata
            .get(id)
            .cloned()
            .ok_or_else(|| DnsError::MetadataUnavailable {
                id: id.to_string(),
                reason: "No such container".to_string(),
            })
    }
}

// --- Metadata builders ---

/// Metadata for a container on the default test domain.
pub fn meta(hostname: &str, ip: &str, env: &[&str]) -> WorkloadMetadata {
    WorkloadMetadata {
        hostname: hostname.to_string(),
        domain: DOMAIN.to_string(),
        ip: ip.to_string(),
        env: env.iter().map(|s| s.to_string()).collect(),
    }
}

// --- Harness ---

/// Reconciler wired to a fake runtime and a fresh cache.
pub struct Harness {
    pub runtime: Arc<FakeRuntime>,
    pub cache: RecordCache,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new() -> Self {
        let runtime = Arc::new(FakeRuntime::new());
        let cache = RecordCache::new();
        let reconciler = build_reconciler(runtime.clone(), &cache);
        Self {
            runtime,
            cache,
            reconciler,
        }
    }

    /// Feed one notification through the reconciler.
    pub async fn send(&mut self, id: &str, status: &str) -> TransitionOutcome {
        self.reconciler
            .handle(&Notification::new(id, status))
            .await
    }
}

/// Build a reconciler publishing into `cache`.
pub fn build_reconciler(runtime: Arc<FakeRuntime>, cache: &RecordCache) -> Reconciler {
    let resolver = MetadataResolver::new(runtime);
    let publisher = NamePublisher::new(Arc::new(cache.clone()));
    Reconciler::new(resolver, publisher)
}
