//! Pending confirmations awaiting a human decision.
//!
//! Maps opaque action ids to the plan step they unlock. The gate itself is
//! not synchronized; it lives inside the plan book's lock.

use crate::types::PendingAction;
use std::collections::HashMap;
use tokio::time::Instant;
use uuid::Uuid;

/// Outstanding confirmations keyed by action id.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: HashMap<Uuid, PendingAction>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: PendingAction) {
        self.pending.insert(action.action_id, action);
    }

    /// Remove and return a pending action. Consumed ids return `None`.
    pub fn take(&mut self, action_id: Uuid) -> Option<PendingAction> {
        self.pending.remove(&action_id)
    }

    pub fn get(&self, action_id: Uuid) -> Option<&PendingAction> {
        self.pending.get(&action_id)
    }

    /// Remove whatever is pending for `plan_id`.
    pub fn remove_for_plan(&mut self, plan_id: Uuid) -> Option<PendingAction> {
        let action_id = self
            .pending
            .values()
            .find(|p| p.plan_id == plan_id)
            .map(|p| p.action_id)?;
        self.pending.remove(&action_id)
    }

    /// Drain every pending action whose deadline has passed.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<PendingAction> {
        let expired: Vec<Uuid> = self
            .pending
            .values()
            .filter(|p| p.expires_at <= now)
            .map(|p| p.action_id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
