//! Periodic pass scheduling with cooperative cancellation.
//!
//! One pass runs at a time; the interval wait is the only suspension point
//! and is interruptible, so stopping never has to wait out a full interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::warn;

use super::engine::SyncEngine;
use crate::events::{EventSink, SyncEvent};

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Created, not yet running.
    #[default]
    Idle,
    /// Looping over passes.
    Running,
    /// Stopped; no further passes will run.
    Cancelled,
}

/// Handle that stops a running scheduler.
///
/// Cloneable, idempotent and safe to use from a different task or thread
/// than the one running the scheduler. Each scheduler owns its own stop
/// channel, so several independent mirror sessions can coexist in one
/// process.
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Signal cancellation. Calling it again has no further effect.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Drives reconciliation passes on a fixed interval until stopped.
pub struct SyncScheduler {
    engine: SyncEngine,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    stop_rx: watch::Receiver<bool>,
    state: SchedulerState,
}

impl SyncScheduler {
    /// Create a scheduler and the handle that stops it.
    pub fn new(
        engine: SyncEngine,
        interval: Duration,
        sink: Arc<dyn EventSink>,
    ) -> (Self, StopHandle) {
        let (tx, stop_rx) = watch::channel(false);
        (
            Self {
                engine,
                interval,
                sink,
                stop_rx,
                state: SchedulerState::Idle,
            },
            StopHandle { tx: Arc::new(tx) },
        )
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run passes until cancelled. Blocks the calling task.
    ///
    /// Each pass runs to completion on the blocking pool; cancellation
    /// arriving mid-pass takes effect right after it, which is safe because
    /// passes are idempotent. Nothing inside a pass is fatal to the loop:
    /// every tick is an equal, independent retry with no backoff.
    pub async fn run(&mut self) {
        self.state = SchedulerState::Running;

        while !*self.stop_rx.borrow() {
            let engine = self.engine.clone();
            match tokio::task::spawn_blocking(move || engine.run_pass()).await {
                Ok(result) => {
                    if !result.errors.is_empty() {
                        warn!("pass finished with {} failed items", result.errors.len());
                    }
                }
                Err(e) => {
                    // A panicking pass must not take the scheduler down.
                    warn!("pass aborted: {}", e);
                }
            }

            self.sink.emit(SyncEvent::PassCompleted {
                next_in_seconds: self.interval.as_secs(),
            });

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.stop_rx.changed() => {}
            }
        }

        self.state = SchedulerState::Cancelled;
        self.sink.emit(SyncEvent::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<SyncEvent>>,
    }

    impl EventSink for CollectingSink {
        fn emit(&self, event: SyncEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn test_setup(
        interval: Duration,
    ) -> (
        tempfile::TempDir,
        tempfile::TempDir,
        SyncScheduler,
        StopHandle,
        Arc<CollectingSink>,
    ) {
        let source = tempdir().unwrap();
        let replica = tempdir().unwrap();
        let sink = Arc::new(CollectingSink::default());
        let engine = SyncEngine::new(source.path(), replica.path(), sink.clone());
        let (scheduler, stop) = SyncScheduler::new(engine, interval, sink.clone());
        (source, replica, scheduler, stop, sink)
    }

    #[tokio::test]
    async fn test_stop_before_run_cancels_immediately() {
        let (_source, _replica, mut scheduler, stop, sink) =
            test_setup(Duration::from_secs(3600));

        stop.stop();
        scheduler.run().await;

        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
        let events = sink.events.lock().unwrap();
        assert_eq!(events.as_slice(), &[SyncEvent::Cancelled]);
    }

    #[tokio::test]
    async fn test_runs_pass_then_stops_during_sleep() {
        let (source, replica, mut scheduler, stop, sink) =
            test_setup(Duration::from_secs(3600));
        fs::write(source.path().join("a.txt"), "x").unwrap();

        let handle = tokio::spawn(async move {
            scheduler.run().await;
            scheduler
        });

        // Give the first pass time to complete, then cancel the sleep.
        tokio::time::sleep(Duration::from_millis(300)).await;
        stop.stop();
        let scheduler = handle.await.unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
        assert_eq!(
            fs::read_to_string(replica.path().join("a.txt")).unwrap(),
            "x"
        );

        let events = sink.events.lock().unwrap();
        assert!(events.contains(&SyncEvent::PassStarted));
        assert!(events.contains(&SyncEvent::PassCompleted {
            next_in_seconds: 3600
        }));
        assert_eq!(events.last(), Some(&SyncEvent::Cancelled));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_across_clones() {
        let (_source, _replica, mut scheduler, stop, _sink) =
            test_setup(Duration::from_secs(3600));

        let other = stop.clone();
        stop.stop();
        other.stop();
        stop.stop();

        scheduler.run().await;
        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
    }
}
