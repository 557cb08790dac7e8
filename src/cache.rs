//! In-memory resolution cache.
//!
//! Records are keyed by fully-qualified name. A derived index maps each
//! reverse-zone key back to the names pointing at that address, so an
//! embedding DNS server can answer PTR queries without scanning.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::metrics;

/// The unit stored per published name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRecord {
    /// Target address.
    pub ip: String,
    /// Reverse-zone name for `ip`, empty when it could not be computed.
    pub reverse_key: String,
    /// Fully-qualified name this record is stored under.
    pub name: String,
}

/// Write side of the resolution store, as seen by the publisher.
pub trait ResolutionCache: Send + Sync {
    /// Insert or overwrite the record stored under `name`.
    fn set(&self, name: &str, record: ResolutionRecord);

    /// Remove the record stored under `name`. Returns false when nothing was
    /// stored there.
    fn remove(&self, name: &str) -> bool;
}

/// Thread-safe record cache.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    inner: Arc<RwLock<RecordCacheInner>>,
}

#[derive(Debug, Default)]
struct RecordCacheInner {
    /// name -> record
    records: HashMap<String, ResolutionRecord>,

    /// reverse key -> names (derived, sorted)
    reverse: HashMap<String, Vec<String>>,

    /// Incremented whenever stored content changes
    serial: u32,
}

impl RecordCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for a fully-qualified name.
    pub fn lookup(&self, name: &str) -> Option<ResolutionRecord> {
        self.inner.read().records.get(name).cloned()
    }

    /// Names whose record carries the given reverse key, sorted.
    pub fn lookup_reverse(&self, reverse_key: &str) -> Vec<String> {
        self.inner
            .read()
            .reverse
            .get(reverse_key)
            .cloned()
            .unwrap_or_default()
    }

    /// Check whether a name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().records.contains_key(name)
    }

    /// All stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().records.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Current serial (for SOA-style change detection).
    pub fn serial(&self) -> u32 {
        self.inner.read().serial
    }

    /// Emit current cache metrics.
    pub fn emit_metrics(&self) {
        let inner = self.inner.read();
        metrics::record_cache_state(inner.records.len(), inner.reverse.len(), inner.serial);
    }

    fn rebuild_reverse_index(inner: &mut RecordCacheInner) {
        inner.reverse.clear();

        for record in inner.records.values() {
            if record.reverse_key.is_empty() {
                continue;
            }
            inner
                .reverse
                .entry(record.reverse_key.clone())
                .or_default()
                .push(record.name.clone());
        }

        for names in inner.reverse.values_mut() {
            names.sort();
        }

        debug!(reverse_keys = inner.reverse.len(), "rebuilt reverse index");
    }
}

impl ResolutionCache for RecordCache {
    fn set(&self, name: &str, record: ResolutionRecord) {
        let mut inner = self.inner.write();
        if inner.records.get(name) == Some(&record) {
            return;
        }
        debug!(name = %name, ip = %record.ip, "setting record");
        inner.records.insert(name.to_string(), record);
        inner.serial = inner.serial.wrapping_add(1);
        Self::rebuild_reverse_index(&mut inner);
    }

    fn remove(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.records.remove(name).is_none() {
            return false;
        }
        debug!(name = %name, "removed record");
        inner.serial = inner.serial.wrapping_add(1);
        Self::rebuild_reverse_index(&mut inner);
        true
    }
}
