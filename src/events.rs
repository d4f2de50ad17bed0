//! Observable events emitted by the mirroring engine.
//!
//! The engine reports everything it does through an [`EventSink`] so the
//! core never depends on a particular logging or output setup.

use std::fmt;

/// An event emitted during mirroring.
///
/// Paths are relative to the tree roots, `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A reconciliation pass has begun.
    PassStarted,
    /// A file new in the source was copied to the replica.
    Copied { path: String },
    /// A file that differed was overwritten in the replica.
    Overwritten { path: String },
    /// A replica-only file was deleted.
    Deleted { path: String },
    /// An empty replica directory was removed.
    DirectoryPruned { path: String },
    /// The source root was absent; the pass was skipped.
    SourceMissing { path: String },
    /// A single action failed; the pass continued.
    ItemError { path: String, cause: String },
    /// A pass finished; the next one runs in `next_in_seconds`.
    PassCompleted { next_in_seconds: u64 },
    /// The scheduler was stopped.
    Cancelled,
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncEvent::PassStarted => write!(f, "synchronization pass started"),
            SyncEvent::Copied { path } => write!(f, "copied: {}", path),
            SyncEvent::Overwritten { path } => write!(f, "overwritten: {}", path),
            SyncEvent::Deleted { path } => write!(f, "deleted: {}", path),
            SyncEvent::DirectoryPruned { path } => write!(f, "removed empty directory: {}", path),
            SyncEvent::SourceMissing { path } => {
                write!(f, "source directory does not exist: {}", path)
            }
            SyncEvent::ItemError { path, cause } => write!(f, "failed on {}: {}", path, cause),
            SyncEvent::PassCompleted { next_in_seconds } => {
                write!(
                    f,
                    "synchronization complete, next pass in {} seconds",
                    next_in_seconds
                )
            }
            SyncEvent::Cancelled => write!(f, "synchronization cancelled"),
        }
    }
}

/// Receives engine events.
///
/// Implementations must be callable from the blocking pass as well as from
/// the scheduler task.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Default sink: forwards every event to `tracing`.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SyncEvent) {
        match &event {
            SyncEvent::ItemError { .. } | SyncEvent::SourceMissing { .. } => {
                tracing::warn!("{}", event)
            }
            SyncEvent::PassStarted => tracing::debug!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = SyncEvent::Copied {
            path: "sub/b.txt".to_string(),
        };
        assert_eq!(event.to_string(), "copied: sub/b.txt");

        let event = SyncEvent::PassCompleted { next_in_seconds: 30 };
        assert_eq!(
            event.to_string(),
            "synchronization complete, next pass in 30 seconds"
        );
    }
}
