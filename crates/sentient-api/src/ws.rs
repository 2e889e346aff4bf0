//! WebSocket push/confirm channel.
//!
//! Every connected client receives the same push messages as the SSE
//! stream and can answer confirmation requests on the same socket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use sentient_core::events::{ClientMessage, PushMessage};
use tokio::sync::broadcast::error::RecvError;

use crate::state::BrainState;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<BrainState>) -> Response {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

async fn handle_session(mut socket: WebSocket, state: BrainState) {
    let mut pushes = state.channel.subscribe();
    tracing::debug!("WebSocket client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = handle_client_message(&state, text.as_str()).await {
                        if send_message(&mut socket, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "WebSocket receive failed");
                    break;
                }
            },
            pushed = pushes.recv() => match pushed {
                Ok(message) => {
                    if send_message(&mut socket, &message).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket client lagging, push messages dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::debug!("WebSocket client disconnected");
}

/// Apply one client message. Returns a direct reply for this client only;
/// plan progress reaches every client through the push channel.
pub async fn handle_client_message(state: &BrainState, text: &str) -> Option<PushMessage> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            return Some(PushMessage::Error {
                content: format!("Invalid message: {}", e),
            })
        }
    };

    match message {
        ClientMessage::Confirm(payload) => {
            if let Some(by) = &payload.authorized_by {
                tracing::info!(target: "audit", action_id = %payload.action_id, authorized_by = %by, "Confirmation received");
            }
            match state.orchestrator.confirm(payload.action_id).await {
                Ok(_) => None,
                Err(e) => Some(PushMessage::Error {
                    content: e.to_string(),
                }),
            }
        }
        ClientMessage::Reject(payload) => match state.orchestrator.reject(payload.action_id) {
            Ok(_) => None,
            Err(e) => Some(PushMessage::Error {
                content: e.to_string(),
            }),
        },
        ClientMessage::Ping => Some(PushMessage::Pong),
    }
}

async fn send_message(socket: &mut WebSocket, message: &PushMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).unwrap_or_default();
    socket.send(Message::Text(json.into())).await
}
