//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries one [`LiveEvent`] per dispatched notification. It is
//! shared via `Arc<EventBus>`; the [`LiveRelay`](crate::relay::LiveRelay)
//! is its main subscriber.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use siteworks_core::actors::ActorRef;
use siteworks_core::notifications::NotificationKind;
use siteworks_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// LiveEvent
// ---------------------------------------------------------------------------

/// A notification ready for live delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEvent {
    /// Socket event name clients listen for.
    pub kind: NotificationKind,

    /// Actor whose live connections receive the event.
    pub receiver: ActorRef,

    /// Set for conversation-scoped events; the event is also broadcast on
    /// `conversation:{id}`.
    pub conversation_id: Option<DbId>,

    /// The persisted notification row, or the unpersisted input when the
    /// durable write failed.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl LiveEvent {
    pub fn new(kind: NotificationKind, receiver: ActorRef, payload: serde_json::Value) -> Self {
        Self {
            kind,
            receiver,
            conversation_id: None,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Mark the event as belonging to a conversation.
    pub fn in_conversation(mut self, conversation_id: DbId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use siteworks_core::actors::ActorRef;
/// use siteworks_core::notifications::NotificationKind;
/// use siteworks_events::bus::{EventBus, LiveEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(LiveEvent::new(
///     NotificationKind::OfferReceived,
///     ActorRef::subcontractor(7),
///     serde_json::json!({}),
/// ));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<LiveEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`. Only live pushes
    /// are lost that way; the durable record is already written.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: LiveEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
