//! Bus-to-socket relay.
//!
//! [`LiveRelay`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! pushes every [`LiveEvent`] to the receiver's live connections, plus the
//! conversation channel for conversation-scoped events. It runs as a
//! long-lived background task and exits when the bus is dropped.

use std::sync::Arc;

use siteworks_core::channels::{actor_channel, conversation_channel};
use tokio::sync::broadcast;

use crate::bus::LiveEvent;
use crate::presence::{OutboundFrame, PresenceRegistry};

pub struct LiveRelay {
    presence: Arc<PresenceRegistry>,
}

impl LiveRelay {
    pub fn new(presence: Arc<PresenceRegistry>) -> Self {
        Self { presence }
    }

    /// Run the relay loop until the bus closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<LiveEvent>) {
        tracing::info!("Live relay started");
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.relay(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Live relay lagged, some pushes were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, live relay shutting down");
                    break;
                }
            }
        }
    }

    /// Push one event. Returns the number of connections reached.
    pub async fn relay(&self, event: LiveEvent) -> usize {
        let mut channels = vec![actor_channel(event.receiver)];
        if let Some(id) = event.conversation_id {
            channels.push(conversation_channel(id));
        }

        let frame = OutboundFrame::event(event.kind.as_str(), event.payload);
        let reached = self.presence.deliver(&channels, frame).await;
        tracing::debug!(
            kind = %event.kind,
            receiver = %event.receiver,
            reached,
            "Relayed live event"
        );
        reached
    }
}
