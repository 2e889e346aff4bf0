use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ExecutionStatus, Timestamp};

/// Messages pushed from the brain to connected clients.
///
/// Serialized with a `type` discriminator so any transport (SSE, WebSocket)
/// can forward them verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[non_exhaustive]
pub enum PushMessage {
    /// A plan step awaits human confirmation.
    #[serde(rename = "action.request")]
    ConfirmationRequest {
        action_id: Uuid,
        plan_id: Uuid,
        step_index: usize,
        intent: String,
        summary: String,
        payload: serde_json::Value,
        expires_at: Timestamp,
    },

    /// Free-text status update after a confirmation was handled.
    #[serde(rename = "notification")]
    Notification {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plan_id: Option<Uuid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<ExecutionStatus>,
    },

    /// Every step of the plan was executed.
    #[serde(rename = "plan.completed")]
    PlanCompleted { plan_id: Uuid },

    /// A step produced a halting outcome; no further steps are surfaced.
    #[serde(rename = "plan.halted")]
    PlanHalted {
        plan_id: Uuid,
        step_index: usize,
        reason: String,
    },

    /// The plan was declined, expired, or abandoned.
    #[serde(rename = "plan.abandoned")]
    PlanAbandoned {
        plan_id: Uuid,
        step_index: usize,
        reason: String,
    },

    #[serde(rename = "status.pong")]
    Pong,

    #[serde(rename = "error")]
    Error { content: String },
}

impl PushMessage {
    pub fn notification(content: impl Into<String>) -> Self {
        PushMessage::Notification {
            content: content.into(),
            plan_id: None,
            status: None,
        }
    }
}

/// Body of a confirm/reject message sent by a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmPayload {
    pub action_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_by: Option<String>,
}

/// Messages a client sends back over a bidirectional channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "action.confirm")]
    Confirm(ConfirmPayload),
    #[serde(rename = "action.reject")]
    Reject(ConfirmPayload),
    #[serde(rename = "status.ping")]
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_wire_format() {
        let msg = PushMessage::notification("Action Confirmed. Executing...");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "notification", "content": "Action Confirmed. Executing..."})
        );
    }

    #[test]
    fn test_confirmation_request_wire_format() {
        let action_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let msg = PushMessage::ConfirmationRequest {
            action_id,
            plan_id,
            step_index: 0,
            intent: "OPEN_APP".to_string(),
            summary: "Open application: notepad".to_string(),
            payload: serde_json::json!({"action": "OPEN_APP", "params": "notepad"}),
            expires_at: Timestamp(1_700_000_300),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "action.request");
        assert_eq!(json["action_id"], action_id.to_string());
        assert_eq!(json["plan_id"], plan_id.to_string());
        assert_eq!(json["payload"]["params"], "notepad");
    }

    #[test]
    fn test_client_confirm_parses() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"type": "action.confirm", "payload": {{"action_id": "{}", "authorized_by": "test_script"}}}}"#,
            id
        );
        let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
        match msg {
            ClientMessage::Confirm(payload) => {
                assert_eq!(payload.action_id, id);
                assert_eq!(payload.authorized_by.as_deref(), Some("test_script"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_client_ping_parses_without_payload() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "status.ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn test_client_unknown_type_rejected() {
        let parsed: Result<ClientMessage, _> = serde_json::from_str(r#"{"type": "chat"}"#);
        assert!(parsed.is_err());
    }
}
