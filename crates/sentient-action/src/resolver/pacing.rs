//! Global minimum-interval pacing between executed actions.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Spaces executed actions at least `min_interval` apart.
///
/// Slots are reserved under the lock; the wait itself happens outside it,
/// so concurrent callers are serialized in time without blocking each other
/// on the mutex.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserve the next free slot at or after `now`.
    pub fn reserve(&self, now: Instant) -> Instant {
        let mut last = self
            .last_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = match *last {
            Some(prev) => std::cmp::max(now, prev + self.min_interval),
            None => now,
        };
        *last = Some(slot);
        slot
    }

    /// Reserve a slot and sleep until it arrives.
    pub async fn wait(&self) {
        let slot = self.reserve(Instant::now());
        tokio::time::sleep_until(slot).await;
    }
}
