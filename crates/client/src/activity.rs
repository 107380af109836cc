//! Last-interaction timestamp.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Duration, Instant};

/// Records when the operator last touched the app.
///
/// Cheap to clone; every clone shares the same single timestamp, so calling
/// [`ActivityTracker::record_activity`] on every tap costs one store. The
/// value never moves backwards.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    last: Arc<watch::Sender<Instant>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(at: Instant) -> Self {
        let (tx, _rx) = watch::channel(at);
        Self { last: Arc::new(tx) }
    }

    /// Mark "now" as the latest interaction.
    pub fn record_activity(&self) {
        self.record_at(Instant::now());
    }

    /// Mark `at` as the latest interaction unless a later one is already known.
    pub fn record_at(&self, at: Instant) {
        self.last.send_if_modified(|last| {
            if at > *last {
                *last = at;
                true
            } else {
                false
            }
        });
    }

    pub fn last_activity(&self) -> Instant {
        *self.last.borrow()
    }

    /// Time since the latest interaction, measured at `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity())
    }

    /// Receiver that wakes whenever a newer interaction is recorded.
    pub fn subscribe(&self) -> watch::Receiver<Instant> {
        self.last.subscribe()
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}
