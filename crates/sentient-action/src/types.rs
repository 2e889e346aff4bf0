//! Core types and value objects for the action pipeline.
//!
//! Defines canonical actions, plan steps, plans, and pending confirmations.

use sentient_core::types::{ExecutionResult, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Confirmed,
    Executed,
    Rejected,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Confirmed => write!(f, "confirmed"),
            StepStatus::Executed => write!(f, "executed"),
            StepStatus::Rejected => write!(f, "rejected"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Where a plan currently sits in the confirmation loop.
///
/// `AwaitingConfirmation` is the only state that owns a pending action, which
/// is what keeps confirmation single-flight per plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlanState {
    AwaitingConfirmation { action_id: Uuid, step_index: usize },
    Executing { step_index: usize },
    Completed,
    Halted { step_index: usize },
    Abandoned { step_index: usize },
}

impl PlanState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlanState::Completed | PlanState::Halted { .. } | PlanState::Abandoned { .. }
        )
    }

    pub fn pending_action(&self) -> Option<Uuid> {
        match self {
            PlanState::AwaitingConfirmation { action_id, .. } => Some(*action_id),
            _ => None,
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// A resolved (action, params) pair used for dispatch and dedup comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAction {
    pub action: String,
    pub params: serde_json::Value,
}

impl CanonicalAction {
    pub fn new(action: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }
}

/// A step as supplied by planning, before it is tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl StepSpec {
    pub fn new(action: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }
}

/// A tracked plan step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub action_name: String,
    pub raw_params: serde_json::Value,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
}

impl From<StepSpec> for Step {
    fn from(step: StepSpec) -> Self {
        Self {
            action_name: step.action,
            raw_params: step.params,
            status: StepStatus::Pending,
            result: None,
        }
    }
}

/// A multi-step plan owned by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: Uuid,
    pub agent_id: String,
    pub steps: Vec<Step>,
    /// Index of the next unconfirmed step.
    pub progress_index: usize,
    pub state: PlanState,
    pub created_at: Timestamp,
}

impl Plan {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// A plan step surfaced for human confirmation.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action_id: Uuid,
    pub plan_id: Uuid,
    pub step_index: usize,
    pub execution_payload: StepSpec,
    pub created_at: Timestamp,
    pub expires_at: tokio::time::Instant,
}

/// Read-only view of a plan returned to API callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub plan_id: Uuid,
    pub agent_id: String,
    pub state: PlanState,
    pub progress_index: usize,
    pub steps: Vec<Step>,
    pub pending_action_id: Option<Uuid>,
    pub created_at: Timestamp,
}

impl From<&Plan> for PlanSnapshot {
    fn from(plan: &Plan) -> Self {
        Self {
            plan_id: plan.plan_id,
            agent_id: plan.agent_id.clone(),
            state: plan.state,
            progress_index: plan.progress_index,
            steps: plan.steps.clone(),
            pending_action_id: plan.state.pending_action(),
            created_at: plan.created_at,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_status_display() {
        assert_eq!(StepStatus::Pending.to_string(), "pending");
        assert_eq!(StepStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(StepStatus::Executed.to_string(), "executed");
        assert_eq!(StepStatus::Rejected.to_string(), "rejected");
        assert_eq!(StepStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_plan_state_terminal() {
        let id = Uuid::new_v4();
        assert!(!PlanState::AwaitingConfirmation { action_id: id, step_index: 0 }.is_terminal());
        assert!(!PlanState::Executing { step_index: 0 }.is_terminal());
        assert!(PlanState::Completed.is_terminal());
        assert!(PlanState::Halted { step_index: 1 }.is_terminal());
        assert!(PlanState::Abandoned { step_index: 0 }.is_terminal());
    }

    #[test]
    fn test_plan_state_pending_action_only_when_awaiting() {
        let id = Uuid::new_v4();
        let awaiting = PlanState::AwaitingConfirmation { action_id: id, step_index: 2 };
        assert_eq!(awaiting.pending_action(), Some(id));
        assert_eq!(PlanState::Executing { step_index: 2 }.pending_action(), None);
        assert_eq!(PlanState::Completed.pending_action(), None);
    }

    #[test]
    fn test_plan_state_wire_format() {
        let json = serde_json::to_value(PlanState::Halted { step_index: 1 }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "halted", "step_index": 1}));
    }

    #[test]
    fn test_step_from_spec_starts_pending() {
        let step: Step = StepSpec::new("OPEN_APP", serde_json::json!("notepad")).into();
        assert_eq!(step.status, StepStatus::Pending);
        assert_eq!(step.action_name, "OPEN_APP");
        assert!(step.result.is_none());
    }

    #[test]
    fn test_step_spec_params_default_to_null() {
        let step: StepSpec = serde_json::from_str(r#"{"action": "CLICK"}"#).unwrap();
        assert!(step.params.is_null());
    }
}
