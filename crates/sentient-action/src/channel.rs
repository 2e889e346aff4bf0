//! Push channel abstraction.
//!
//! The orchestrator publishes [`PushMessage`]s without knowing whether they
//! reach clients over SSE, WebSocket, or nothing at all.

use sentient_core::events::PushMessage;
use tokio::sync::broadcast;

/// Default buffer for slow subscribers before they start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fire-and-forget publisher of push messages.
pub trait PushChannel: Send + Sync {
    fn publish(&self, message: PushMessage);
}

/// In-process fan-out over a tokio broadcast channel.
pub struct BroadcastChannel {
    sender: broadcast::Sender<PushMessage>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl PushChannel for BroadcastChannel {
    fn publish(&self, message: PushMessage) {
        // No subscribers is not an error.
        if self.sender.send(message).is_err() {
            tracing::debug!("Push message dropped: no subscribers");
        }
    }
}
