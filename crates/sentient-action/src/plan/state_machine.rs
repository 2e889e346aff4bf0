//! Step state machine with validated transitions.
//!
//! Pending -> Confirmed -> Executed | Failed
//! Pending -> Rejected

use crate::error::PlanError;
use crate::types::StepStatus;

/// Validate that a step status transition is allowed.
///
/// Rejected, Executed and Failed are terminal; nothing returns to Pending.
pub fn validate_transition(from: StepStatus, to: StepStatus) -> Result<(), PlanError> {
    let valid = matches!(
        (from, to),
        (StepStatus::Pending, StepStatus::Confirmed)
            | (StepStatus::Pending, StepStatus::Rejected)
            | (StepStatus::Confirmed, StepStatus::Executed)
            | (StepStatus::Confirmed, StepStatus::Failed)
    );

    if valid {
        Ok(())
    } else {
        Err(PlanError::InvalidTransition(from, to))
    }
}

pub fn is_terminal(status: StepStatus) -> bool {
    matches!(
        status,
        StepStatus::Executed | StepStatus::Rejected | StepStatus::Failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [StepStatus; 5] = [
        StepStatus::Pending,
        StepStatus::Confirmed,
        StepStatus::Executed,
        StepStatus::Rejected,
        StepStatus::Failed,
    ];

    // =====================================================================
    // Valid transitions
    // =====================================================================

    #[test]
    fn test_pending_to_confirmed() {
        assert!(validate_transition(StepStatus::Pending, StepStatus::Confirmed).is_ok());
    }

    #[test]
    fn test_pending_to_rejected() {
        assert!(validate_transition(StepStatus::Pending, StepStatus::Rejected).is_ok());
    }

    #[test]
    fn test_confirmed_to_executed() {
        assert!(validate_transition(StepStatus::Confirmed, StepStatus::Executed).is_ok());
    }

    #[test]
    fn test_confirmed_to_failed() {
        assert!(validate_transition(StepStatus::Confirmed, StepStatus::Failed).is_ok());
    }

    // =====================================================================
    // Invalid transitions
    // =====================================================================

    #[test]
    fn test_terminal_states_never_move() {
        for from in ALL.into_iter().filter(|s| is_terminal(*s)) {
            for to in ALL {
                assert!(
                    validate_transition(from, to).is_err(),
                    "{} -> {} should be rejected",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_nothing_returns_to_pending() {
        for from in ALL {
            assert!(validate_transition(from, StepStatus::Pending).is_err());
        }
    }

    #[test]
    fn test_pending_cannot_skip_confirmation() {
        assert!(validate_transition(StepStatus::Pending, StepStatus::Executed).is_err());
        assert!(validate_transition(StepStatus::Pending, StepStatus::Failed).is_err());
    }

    #[test]
    fn test_invalid_transition_error_message() {
        let err = validate_transition(StepStatus::Executed, StepStatus::Pending).unwrap_err();
        assert_eq!(err.to_string(), "Invalid step transition: executed -> pending");
    }

    #[test]
    fn test_is_terminal() {
        assert!(!is_terminal(StepStatus::Pending));
        assert!(!is_terminal(StepStatus::Confirmed));
        assert!(is_terminal(StepStatus::Executed));
        assert!(is_terminal(StepStatus::Rejected));
        assert!(is_terminal(StepStatus::Failed));
    }
}
