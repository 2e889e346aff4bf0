//! Short-lived action history used for duplicate suppression.

use crate::types::CanonicalAction;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct HistoryEntry {
    at: Instant,
    action: CanonicalAction,
}

/// Time-ordered buffer of recently handled canonical actions.
///
/// Entries older than the retention window are evicted lazily on each check.
#[derive(Debug)]
pub struct ActionHistory {
    entries: VecDeque<HistoryEntry>,
    retention: Duration,
    suppression: Duration,
}

impl ActionHistory {
    pub fn new(retention: Duration, suppression: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
            suppression,
        }
    }

    /// Returns `true` if `action` matches an entry inside the suppression
    /// window. Otherwise records it and returns `false`.
    pub fn check_and_record(&mut self, action: &CanonicalAction, now: Instant) -> bool {
        self.prune(now);

        let duplicate = self.entries.iter().rev().any(|entry| {
            now.saturating_duration_since(entry.at) <= self.suppression
                && entry.action == *action
        });
        if duplicate {
            return true;
        }

        self.entries.push_back(HistoryEntry {
            at: now,
            action: action.clone(),
        });
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.entries.front() {
            if now.saturating_duration_since(front.at) > self.retention {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }
}
