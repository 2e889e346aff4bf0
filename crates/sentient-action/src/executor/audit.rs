//! Audit trail of REAL execution attempts.

use sentient_core::types::{ExecutionStatus, Timestamp};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of records kept in memory.
pub const DEFAULT_AUDIT_CAPACITY: usize = 500;

/// One REAL execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub timestamp: Timestamp,
    pub agent_id: String,
    pub action: String,
    pub params: serde_json::Value,
    pub status: ExecutionStatus,
    pub message: String,
}

/// Bounded in-memory audit buffer. Every record is also emitted under the
/// `audit` tracing target.
pub struct AuditLog {
    capacity: usize,
    records: Mutex<VecDeque<AuditRecord>>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, record: AuditRecord) {
        tracing::info!(
            target: "audit",
            agent_id = %record.agent_id,
            action = %record.action,
            params = %record.params,
            status = %record.status,
            message = %record.message,
            "REAL action"
        );

        let mut records = self.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Up to `limit` most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<AuditRecord> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AuditRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(action: &str) -> AuditRecord {
        AuditRecord {
            timestamp: Timestamp::now(),
            agent_id: "user".to_string(),
            action: action.to_string(),
            params: json!(null),
            status: ExecutionStatus::Success,
            message: "ok".to_string(),
        }
    }

    #[test]
    fn test_recent_is_newest_first() {
        let log = AuditLog::default();
        log.record(record("CLICK"));
        log.record(record("SCROLL"));
        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "SCROLL");
        assert_eq!(recent[1].action, "CLICK");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = AuditLog::new(2);
        log.record(record("A"));
        log.record(record("B"));
        log.record(record("C"));
        assert_eq!(log.len(), 2);
        let actions: Vec<_> = log.recent(10).into_iter().map(|r| r.action).collect();
        assert_eq!(actions, vec!["C", "B"]);
    }

    #[test]
    fn test_recent_respects_limit() {
        let log = AuditLog::default();
        for _ in 0..5 {
            log.record(record("CLICK"));
        }
        assert_eq!(log.recent(3).len(), 3);
        assert!(!log.is_empty());
    }
}
