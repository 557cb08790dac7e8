//! Lifecycle notifications and their classification.
//!
//! The runtime reports lifecycle changes as free text: event actions such as
//! `create`, `start` or `die` on the live feed, and listing statuses such as
//! `Up 2 hours` or `Created` at startup. That text is matched exactly once,
//! here, and everything downstream works on [`NotificationKind`].

use std::fmt;

/// A `(id, status text)` pair observed for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Opaque container identifier.
    pub id: String,
    /// Raw status text as delivered by the runtime.
    pub status: String,
}

impl Notification {
    /// Create a notification.
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
        }
    }

    /// Classify the status text.
    pub fn kind(&self) -> NotificationKind {
        NotificationKind::classify(&self.status)
    }
}

/// Discrete lifecycle transition inferred from status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Container was created but not started.
    Created,
    /// Container process started.
    Started,
    /// Container reported as running (listing status or health report).
    HeartbeatUp,
    /// Container process exited.
    Died,
    /// Anything else (exec, attach, health checks, ...).
    Unknown,
}

impl NotificationKind {
    /// Classify raw status text.
    ///
    /// Matching is case-sensitive substring search, except that the listing
    /// status `Created` also counts as a creation. When several markers are
    /// present the precedence is `die` > `Up` > `start` > `create`.
    pub fn classify(status: &str) -> Self {
        if status.contains("die") {
            Self::Died
        } else if status.contains("Up") {
            Self::HeartbeatUp
        } else if status.contains("start") {
            Self::Started
        } else if status.contains("create") || status.starts_with("Created") {
            Self::Created
        } else {
            Self::Unknown
        }
    }

    /// Label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::HeartbeatUp => "up",
            Self::Died => "died",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
