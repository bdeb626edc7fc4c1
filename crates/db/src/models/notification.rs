//! Notification entity models.

use serde::{Deserialize, Serialize};
use siteworks_core::actors::{ActorRef, ActorType, Party};
use siteworks_core::notifications::{NotificationKind, RelatedEntityType};
use siteworks_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub notification_type: NotificationKind,
    pub title: String,
    pub message: String,
    pub sender_id: DbId,
    #[sqlx(try_from = "String")]
    pub sender_type: ActorType,
    pub sender_name: String,
    pub receiver_id: DbId,
    #[sqlx(try_from = "String")]
    pub receiver_type: ActorType,
    pub related_entity_id: DbId,
    #[sqlx(try_from = "String")]
    pub related_entity_type: RelatedEntityType,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn receiver(&self) -> ActorRef {
        ActorRef {
            id: self.receiver_id,
            actor_type: self.receiver_type,
        }
    }
}

/// A notification about to be written. One per receiver per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub sender: Party,
    pub receiver: ActorRef,
    pub related_entity_id: DbId,
    pub related_entity_type: RelatedEntityType,
    pub data: serde_json::Value,
}

/// One page of a receiver's notifications.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}
