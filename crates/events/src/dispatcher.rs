//! Notification dispatch: durable write first, live push second.
//!
//! [`NotificationDispatcher::dispatch`] never fails from the caller's point
//! of view. The write is retried a bounded number of times and logged at
//! `error` when every attempt fails; the live push through the
//! [`EventBus`] happens regardless, carrying the unpersisted input in that
//! case.

use std::sync::Arc;
use std::time::Duration;

use siteworks_core::types::DbId;
use siteworks_db::models::notification::{NewNotification, Notification};
use siteworks_db::store::NotificationRepository;

use crate::bus::{EventBus, LiveEvent};

/// Default number of write attempts per notification.
pub const DEFAULT_WRITE_ATTEMPTS: u32 = 3;

/// Base delay between write attempts; attempt `n` waits `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
    bus: Arc<EventBus>,
    write_attempts: u32,
}

impl NotificationDispatcher {
    pub fn new(notifications: Arc<dyn NotificationRepository>, bus: Arc<EventBus>) -> Self {
        Self {
            notifications,
            bus,
            write_attempts: DEFAULT_WRITE_ATTEMPTS,
        }
    }

    pub fn with_write_attempts(mut self, attempts: u32) -> Self {
        self.write_attempts = attempts.max(1);
        self
    }

    /// Persist one notification, then publish it for live delivery.
    ///
    /// Returns the stored row, or `None` when every write attempt failed.
    pub async fn dispatch(&self, input: NewNotification) -> Option<Notification> {
        self.dispatch_in(input, None).await
    }

    /// Like [`dispatch`](Self::dispatch), additionally broadcasting on the
    /// conversation channel.
    pub async fn dispatch_in(
        &self,
        input: NewNotification,
        conversation_id: Option<DbId>,
    ) -> Option<Notification> {
        let stored = self.persist(&input).await;

        let payload = match &stored {
            Some(row) => serde_json::to_value(row),
            None => serde_json::to_value(&input),
        }
        .unwrap_or(serde_json::Value::Null);

        let mut event = LiveEvent::new(input.kind, input.receiver, payload);
        if let Some(id) = conversation_id.filter(|_| input.kind.is_conversation_scoped()) {
            event = event.in_conversation(id);
        }
        self.bus.publish(event);

        stored
    }

    /// Dispatch a batch in order. Returns the number persisted.
    pub async fn dispatch_all(&self, inputs: Vec<NewNotification>) -> usize {
        let mut persisted = 0;
        for input in inputs {
            if self.dispatch(input).await.is_some() {
                persisted += 1;
            }
        }
        persisted
    }

    async fn persist(&self, input: &NewNotification) -> Option<Notification> {
        for attempt in 1..=self.write_attempts {
            match self.notifications.insert_notification(input).await {
                Ok(row) => return Some(row),
                Err(e) if attempt < self.write_attempts => {
                    tracing::warn!(
                        error = %e,
                        attempt,
                        kind = %input.kind,
                        receiver = %input.receiver,
                        "Notification write failed, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        attempts = self.write_attempts,
                        kind = %input.kind,
                        receiver = %input.receiver,
                        related_entity_id = input.related_entity_id,
                        "Notification write failed, giving up"
                    );
                }
            }
        }
        None
    }
}
