//! Metrics instrumentation for container-dns.
//!
//! All metrics are prefixed with `container_dns.`

use metrics::{counter, gauge, histogram};
use std::time::Instant;

use crate::event::NotificationKind;

/// Record a lifecycle notification by classified kind.
pub fn record_notification(kind: NotificationKind) {
    counter!("container_dns.notification.count", "kind" => kind.as_str()).increment(1);
}

/// What a notification resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Container started being tracked, nothing published yet.
    Track,
    /// Names were (re)published.
    Register,
    /// Names were withdrawn and tracking stopped.
    Withdraw,
    /// Metadata could not be queried, so the container was dropped.
    Dropped,
    /// No state change.
    Ignore,
}

/// Record the outcome of a transition decision.
pub fn record_transition(outcome: TransitionOutcome) {
    let outcome_str = match outcome {
        TransitionOutcome::Track => "track",
        TransitionOutcome::Register => "register",
        TransitionOutcome::Withdraw => "withdraw",
        TransitionOutcome::Dropped => "dropped",
        TransitionOutcome::Ignore => "ignore",
    };

    counter!("container_dns.transition.count", "outcome" => outcome_str).increment(1);
}

/// Record time spent handling one notification, including runtime queries.
pub fn record_transition_duration(duration: std::time::Duration) {
    histogram!("container_dns.transition.duration.seconds").record(duration.as_secs_f64());
}

/// Record a name written to the cache.
pub fn record_published() {
    counter!("container_dns.record.published.count").increment(1);
}

/// Record a name actually removed from the cache. Withdrawals of names
/// that were not stored are not counted.
pub fn record_withdrawn() {
    counter!("container_dns.record.withdrawn.count").increment(1);
}

/// Record a failed metadata query (`phase` is "register" or "withdraw").
pub fn record_metadata_failure(phase: &'static str) {
    counter!("container_dns.metadata.failure.count", "phase" => phase).increment(1);
}

/// Record an address that could not be turned into a reverse-zone name.
pub fn record_reverse_key_failure() {
    counter!("container_dns.reverse_key.failure.count").increment(1);
}

/// Record an error item on the live event feed.
pub fn record_feed_error() {
    counter!("container_dns.feed.error.count").increment(1);
}

/// Record how many running containers the startup pass reconciled.
pub fn record_startup_reconciled(count: usize) {
    gauge!("container_dns.startup.reconciled").set(count as f64);
}

/// Record the number of tracked containers.
pub fn record_tracked_count(count: usize) {
    gauge!("container_dns.state.tracked.count").set(count as f64);
}

/// Record cache size and serial.
pub fn record_cache_state(records: usize, reverse_keys: usize, serial: u32) {
    gauge!("container_dns.cache.records.count").set(records as f64);
    gauge!("container_dns.cache.reverse_keys.count").set(reverse_keys as f64);
    gauge!("container_dns.cache.serial").set(serial as f64);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
