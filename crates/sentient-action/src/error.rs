//! Error types for the action pipeline.

use crate::types::StepStatus;
use sentient_core::types::ExecutionResult;
use uuid::Uuid;

/// Errors from action handler execution.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Pointer target ({x}, {y}) is outside the {width}x{height} screen")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("Application not whitelisted: {0}")]
    NotWhitelisted(String),
    #[error("Payload validation failed: {0}")]
    InvalidPayload(String),
    #[error("Action handler failed: {0}")]
    HandlerFailed(String),
    #[error("Not supported on this platform: {0}")]
    Unsupported(String),
}

impl ActionError {
    /// Convert into the result reported to the caller.
    ///
    /// Rejected inputs map to `failed`; anything that went wrong while
    /// dispatching maps to `error`.
    pub fn into_result(self, action: &str) -> ExecutionResult {
        match self {
            ActionError::OutOfBounds { .. }
            | ActionError::NotWhitelisted(_)
            | ActionError::InvalidPayload(_) => {
                ExecutionResult::failed(self.to_string()).for_action(action)
            }
            ActionError::UnknownAction(_)
            | ActionError::HandlerFailed(_)
            | ActionError::Unsupported(_) => {
                ExecutionResult::error(self.to_string()).for_action(action)
            }
        }
    }
}

/// Errors from the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Worker pool is stopped")]
    Stopped,
    #[error("Task panicked: {0}")]
    TaskPanicked(String),
    #[error("Task was dropped before completion")]
    Dropped,
}

/// Errors from plan lifecycle management.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Plan has no steps")]
    EmptyPlan,
    #[error("Plan not found: {0}")]
    NotFound(Uuid),
    #[error("No pending confirmation for action: {0}")]
    UnknownConfirmation(Uuid),
    #[error("Confirmation expired for action: {0}")]
    Expired(Uuid),
    #[error("Plan already finished: {0}")]
    AlreadyFinished(Uuid),
    #[error("Invalid step transition: {0} -> {1}")]
    InvalidTransition(StepStatus, StepStatus),
}

/// Errors from the Brain to Kernel transport.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Kernel request timed out")]
    Timeout,
    #[error("Kernel unreachable: {0}")]
    Connect(String),
    #[error("Kernel returned HTTP {0}")]
    Status(u16),
    #[error("Undecodable kernel response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BridgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BridgeError::Timeout
        } else if e.is_decode() {
            BridgeError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            BridgeError::Status(status.as_u16())
        } else {
            BridgeError::Connect(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentient_core::types::ExecutionStatus;

    #[test]
    fn test_action_error_display() {
        let err = ActionError::UnknownAction("FLY".to_string());
        assert_eq!(err.to_string(), "Unknown action: FLY");

        let err = ActionError::NotWhitelisted("regedit".to_string());
        assert_eq!(err.to_string(), "Application not whitelisted: regedit");

        let err = ActionError::OutOfBounds {
            x: 5000,
            y: 10,
            width: 1920,
            height: 1080,
        };
        assert_eq!(
            err.to_string(),
            "Pointer target (5000, 10) is outside the 1920x1080 screen"
        );
    }

    #[test]
    fn test_rejected_inputs_map_to_failed() {
        for err in [
            ActionError::NotWhitelisted("regedit".to_string()),
            ActionError::InvalidPayload("missing text".to_string()),
            ActionError::OutOfBounds {
                x: -1,
                y: 0,
                width: 10,
                height: 10,
            },
        ] {
            let result = err.into_result("OPEN_APP");
            assert_eq!(result.status, ExecutionStatus::Failed);
            assert_eq!(result.action.as_deref(), Some("OPEN_APP"));
        }
    }

    #[test]
    fn test_dispatch_problems_map_to_error() {
        let result = ActionError::UnknownAction("FLY".to_string()).into_result("FLY");
        assert_eq!(result.status, ExecutionStatus::Error);
        assert_eq!(result.reason.as_deref(), Some("Unknown action: FLY"));

        let result = ActionError::HandlerFailed("boom".to_string()).into_result("CLICK");
        assert_eq!(result.status, ExecutionStatus::Error);

        let result = ActionError::Unsupported("input".to_string()).into_result("CLICK");
        assert_eq!(result.status, ExecutionStatus::Error);
    }

    #[test]
    fn test_plan_error_display() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            PlanError::UnknownConfirmation(id).to_string(),
            "No pending confirmation for action: 550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(PlanError::EmptyPlan.to_string(), "Plan has no steps");

        let err = PlanError::InvalidTransition(StepStatus::Executed, StepStatus::Pending);
        assert_eq!(err.to_string(), "Invalid step transition: executed -> pending");
    }

    #[test]
    fn test_bridge_error_display() {
        assert_eq!(BridgeError::Status(502).to_string(), "Kernel returned HTTP 502");
        assert_eq!(BridgeError::Timeout.to_string(), "Kernel request timed out");
    }
}
