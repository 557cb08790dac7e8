//! Lifecycle reconciliation.
//!
//! Each notification is classified, fed through [`Transition::decide`]
//! together with the currently tracked entry, and the resulting effects are
//! applied in a fixed order:
//!
//! 1. store the new tracked entry (if any)
//! 2. publish current names (register)
//! 3. withdraw current names and stop tracking (withdraw)
//!
//! Per container:
//!
//! ```text
//! Absent ──create──▶ Tracked(created) ──start──▶ Tracked(active) ──die──▶ Absent
//!   │                                              ▲        │
//!   └──────────────────────Up──────────────────────┘        └─Up (republish)
//! ```
//!
//! Names are queried fresh from the runtime on every register and withdraw, so
//! withdrawal removes the names the container has *now*, not the ones it had
//! when it was published.

use std::collections::HashMap;
use tracing::{debug, error, trace};

use crate::event::{Notification, NotificationKind};
use crate::metrics::{self, Timer, TransitionOutcome};
use crate::publisher::NamePublisher;
use crate::resolver::MetadataResolver;

/// What the reconciler knows about one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedWorkload {
    /// Container identifier.
    pub id: String,
    /// Most recent raw status text.
    pub last_status: String,
    /// True when this entry was stored by a create notification for a
    /// previously untracked container. A later start only registers then.
    pub created: bool,
    /// True once the entry has been stored for publication.
    pub active: bool,
}

/// Decision for a single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Entry to write into the tracked map, replacing any prior one.
    pub store: Option<TrackedWorkload>,
    /// Publish the container's current names.
    pub register: bool,
    /// Withdraw the container's current names and stop tracking it.
    pub withdraw: bool,
}

impl Transition {
    /// Decide what to do for `notification` given the tracked entry, if any.
    pub fn decide(
        notification: &Notification,
        kind: NotificationKind,
        prev: Option<&TrackedWorkload>,
    ) -> Self {
        let exists = prev.is_some();
        let is_new_creation = !exists && kind == NotificationKind::Created;
        let was_created = prev.is_some_and(|w| w.created);
        let is_starting = was_created && kind == NotificationKind::Started;
        let register = is_starting || kind == NotificationKind::HeartbeatUp;
        let withdraw = kind == NotificationKind::Died && exists;

        let store = (register || is_new_creation).then(|| TrackedWorkload {
            id: notification.id.clone(),
            last_status: notification.status.clone(),
            created: is_new_creation,
            active: true,
        });

        Self {
            store,
            register,
            withdraw,
        }
    }

    fn outcome(&self) -> TransitionOutcome {
        if self.withdraw {
            TransitionOutcome::Withdraw
        } else if self.register {
            TransitionOutcome::Register
        } else if self.store.is_some() {
            TransitionOutcome::Track
        } else {
            TransitionOutcome::Ignore
        }
    }
}

/// Owns the tracked-container map and applies transitions.
///
/// Only one task ever holds the reconciler, so the map needs no lock.
pub struct Reconciler {
    resolver: MetadataResolver,
    publisher: NamePublisher,
    tracked: HashMap<String, TrackedWorkload>,
}

impl Reconciler {
    /// Create a reconciler with an empty tracked map.
    pub fn new(resolver: MetadataResolver, publisher: NamePublisher) -> Self {
        Self {
            resolver,
            publisher,
            tracked: HashMap::new(),
        }
    }

    /// Tracked entry for a container.
    pub fn tracked(&self, id: &str) -> Option<&TrackedWorkload> {
        self.tracked.get(id)
    }

    /// Check whether a container is tracked.
    pub fn is_tracked(&self, id: &str) -> bool {
        self.tracked.contains_key(id)
    }

    /// Number of tracked containers.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Process one notification and report what it resulted in. Errors are
    /// logged and handled here; none reach the caller.
    pub async fn handle(&mut self, notification: &Notification) -> TransitionOutcome {
        let timer = Timer::start();
        let kind = notification.kind();
        let transition = Transition::decide(notification, kind, self.tracked.get(&notification.id));
        let id = notification.id.as_str();

        trace!(
            id,
            status = %notification.status,
            kind = %kind,
            register = transition.register,
            withdraw = transition.withdraw,
            store = transition.store.is_some(),
            "handling notification"
        );
        metrics::record_notification(kind);

        let mut outcome = transition.outcome();

        if let Some(entry) = transition.store {
            self.tracked.insert(entry.id.clone(), entry);
        }

        if transition.register && !self.register_all(id).await {
            outcome = TransitionOutcome::Dropped;
        }

        if transition.withdraw {
            if !self.withdraw_all(id).await {
                outcome = TransitionOutcome::Dropped;
            }
            self.tracked.remove(id);
            debug!(id, "stopped tracking container");
        }

        metrics::record_transition(outcome);
        metrics::record_tracked_count(self.tracked.len());
        metrics::record_transition_duration(timer.elapsed());
        outcome
    }

    /// Publish every current name. On a metadata failure the container is
    /// dropped and false is returned.
    async fn register_all(&mut self, id: &str) -> bool {
        match self.resolver.resolve_names(id).await {
            Ok(names) => {
                for name in &names {
                    self.publisher.publish(name);
                }
                true
            }
            Err(e) => {
                error!(id, error = %e, "Unable to register names, dropping container");
                metrics::record_metadata_failure("register");
                self.tracked.remove(id);
                false
            }
        }
    }

    async fn withdraw_all(&mut self, id: &str) -> bool {
        match self.resolver.resolve_names(id).await {
            Ok(names) => {
                for name in &names {
                    self.publisher.withdraw(name);
                }
                true
            }
            Err(e) => {
                error!(id, error = %e, "Unable to withdraw names, dropping container");
                metrics::record_metadata_failure("withdraw");
                self.tracked.remove(id);
                false
            }
        }
    }
}
