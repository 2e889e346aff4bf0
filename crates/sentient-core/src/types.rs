use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SentientError;

// =============================================================================
// Enums
// =============================================================================

/// Global switch controlling whether action requests are denied, simulated,
/// or eligible for real execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutonomyMode {
    /// All dispatch disabled.
    #[default]
    Off,
    /// Resolution and dedup run, but no OS effect is produced.
    Simulated,
    /// OS effects are produced if the kernel safety lock is also enabled.
    Real,
}

impl fmt::Display for AutonomyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutonomyMode::Off => write!(f, "OFF"),
            AutonomyMode::Simulated => write!(f, "SIMULATED"),
            AutonomyMode::Real => write!(f, "REAL"),
        }
    }
}

impl std::str::FromStr for AutonomyMode {
    type Err = SentientError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(AutonomyMode::Off),
            "SIMULATED" => Ok(AutonomyMode::Simulated),
            "REAL" => Ok(AutonomyMode::Real),
            _ => Err(SentientError::InvalidMode(s.to_string())),
        }
    }
}

/// Outcome tag of a single execution call on the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Simulated,
    Success,
    Failed,
    Denied,
    Error,
    Duplicate,
}

impl ExecutionStatus {
    /// Whether a plan may move on to its next step after this outcome.
    pub fn is_advancing(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Success | ExecutionStatus::Simulated | ExecutionStatus::Duplicate
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Simulated => write!(f, "simulated"),
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Failed => write!(f, "failed"),
            ExecutionStatus::Denied => write!(f, "denied"),
            ExecutionStatus::Error => write!(f, "error"),
            ExecutionStatus::Duplicate => write!(f, "duplicate"),
        }
    }
}

// =============================================================================
// Value objects
// =============================================================================

/// Tagged result of an execution call.
///
/// `detail` carries what happened on success-like outcomes, `reason` carries
/// why on failure-like outcomes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExecutionResult {
    fn with_detail(status: ExecutionStatus, action: Option<String>, detail: String) -> Self {
        Self {
            status,
            action,
            detail: Some(detail),
            reason: None,
        }
    }

    fn with_reason(status: ExecutionStatus, reason: String) -> Self {
        Self {
            status,
            action: None,
            detail: None,
            reason: Some(reason),
        }
    }

    pub fn success(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::with_detail(ExecutionStatus::Success, Some(action.into()), detail.into())
    }

    pub fn simulated(action: impl Into<String>) -> Self {
        Self::with_detail(
            ExecutionStatus::Simulated,
            Some(action.into()),
            "Action handled in simulation mode.".to_string(),
        )
    }

    pub fn duplicate(action: impl Into<String>) -> Self {
        Self::with_detail(
            ExecutionStatus::Duplicate,
            Some(action.into()),
            "Identical action was just handled; suppressed.".to_string(),
        )
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::with_reason(ExecutionStatus::Failed, reason.into())
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::with_reason(ExecutionStatus::Denied, reason.into())
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::with_reason(ExecutionStatus::Error, reason.into())
    }

    /// Attach the canonical action name to a failure-like result.
    pub fn for_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Human-readable one-liner: the detail if present, else the reason.
    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.reason.as_deref())
            .unwrap_or("")
    }
}

/// Request body sent from the brain to the kernel for a single action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub mode: AutonomyMode,
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
}

fn default_agent_id() -> String {
    "user".to_string()
}

impl ExecutionRequest {
    pub fn new(action: impl Into<String>, params: serde_json::Value, mode: AutonomyMode) -> Self {
        Self {
            action: action.into(),
            params,
            mode,
            agent_id: default_agent_id(),
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Unix timestamp in seconds.
///
/// Compared by value. Two Timestamps with the same inner value are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autonomy_mode_display() {
        assert_eq!(AutonomyMode::Off.to_string(), "OFF");
        assert_eq!(AutonomyMode::Simulated.to_string(), "SIMULATED");
        assert_eq!(AutonomyMode::Real.to_string(), "REAL");
    }

    #[test]
    fn test_autonomy_mode_from_str_is_case_insensitive() {
        assert_eq!("off".parse::<AutonomyMode>().unwrap(), AutonomyMode::Off);
        assert_eq!(" Simulated ".parse::<AutonomyMode>().unwrap(), AutonomyMode::Simulated);
        assert_eq!("REAL".parse::<AutonomyMode>().unwrap(), AutonomyMode::Real);
    }

    #[test]
    fn test_autonomy_mode_rejects_unknown() {
        let err = "TURBO".parse::<AutonomyMode>().unwrap_err();
        assert!(matches!(err, SentientError::InvalidMode(_)));
        assert!("".parse::<AutonomyMode>().is_err());
    }

    #[test]
    fn test_autonomy_mode_default_is_off() {
        assert_eq!(AutonomyMode::default(), AutonomyMode::Off);
    }

    #[test]
    fn test_autonomy_mode_wire_format() {
        assert_eq!(serde_json::to_string(&AutonomyMode::Real).unwrap(), "\"REAL\"");
        let mode: AutonomyMode = serde_json::from_str("\"SIMULATED\"").unwrap();
        assert_eq!(mode, AutonomyMode::Simulated);
    }

    #[test]
    fn test_execution_status_advancing() {
        assert!(ExecutionStatus::Success.is_advancing());
        assert!(ExecutionStatus::Simulated.is_advancing());
        assert!(ExecutionStatus::Duplicate.is_advancing());
        assert!(!ExecutionStatus::Failed.is_advancing());
        assert!(!ExecutionStatus::Denied.is_advancing());
        assert!(!ExecutionStatus::Error.is_advancing());
    }

    #[test]
    fn test_execution_result_wire_format_omits_empty_fields() {
        let denied = ExecutionResult::denied("safety lock engaged");
        let json = serde_json::to_value(&denied).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "denied", "reason": "safety lock engaged"})
        );

        let ok = ExecutionResult::success("OPEN_APP", "Opened notepad");
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["action"], "OPEN_APP");
        assert_eq!(json["detail"], "Opened notepad");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_execution_result_message_prefers_detail() {
        assert_eq!(ExecutionResult::success("CLICK", "Clicked").message(), "Clicked");
        assert_eq!(ExecutionResult::error("boom").message(), "boom");
    }

    #[test]
    fn test_execution_request_defaults() {
        let req: ExecutionRequest = serde_json::from_str(r#"{"action": "CLICK"}"#).unwrap();
        assert_eq!(req.action, "CLICK");
        assert_eq!(req.mode, AutonomyMode::Off);
        assert_eq!(req.agent_id, "user");
        assert!(req.params.is_null());
    }

    #[test]
    fn test_timestamp_to_datetime_roundtrip() {
        let now = Utc::now();
        let ts = Timestamp::from_datetime(now);
        assert_eq!(ts.to_datetime().timestamp(), now.timestamp());
    }
}
