//! Conversation and message entity models.

use serde::{Deserialize, Serialize};
use siteworks_core::actors::{ActorRef, ActorType};
use siteworks_core::error::CoreError;
use siteworks_core::types::{DbId, Timestamp};
use siteworks_core::validation::validate_message;
use sqlx::FromRow;

/// A row from the `conversations` table. Joins exactly one company and one
/// subcontractor.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: DbId,
    pub company_id: DbId,
    pub subcontractor_id: DbId,
    pub last_message: Option<String>,
    pub last_message_at: Option<Timestamp>,
    pub company_unread: i32,
    pub subcontractor_unread: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    pub fn is_participant(&self, actor: ActorRef) -> bool {
        match actor.actor_type {
            ActorType::Company => actor.id == self.company_id,
            ActorType::Subcontractor => actor.id == self.subcontractor_id,
            ActorType::System => false,
        }
    }

    /// The other participant, from `actor`'s point of view.
    pub fn counterpart(&self, actor: ActorRef) -> Option<ActorRef> {
        if !self.is_participant(actor) {
            return None;
        }
        Some(match actor.actor_type {
            ActorType::Company => ActorRef::subcontractor(self.subcontractor_id),
            _ => ActorRef::company(self.company_id),
        })
    }

    pub fn unread_for(&self, actor: ActorRef) -> i32 {
        match actor.actor_type {
            ActorType::Company => self.company_unread,
            _ => self.subcontractor_unread,
        }
    }
}

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub conversation_id: DbId,
    pub sender_id: DbId,
    #[sqlx(try_from = "String")]
    pub sender_type: ActorType,
    pub content: String,
    pub attachments: Vec<String>,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// DTO for sending a message in an existing conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessage {
    pub conversation_id: DbId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl SendMessage {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_message(&self.content, &self.attachments)
    }
}

/// DTO for opening a conversation with its first message. The recipient is
/// addressed by id; its type is the opposite of the sender's.
#[derive(Debug, Clone, Deserialize)]
pub struct SendFirstMessage {
    pub recipient_id: DbId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl SendFirstMessage {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_message(&self.content, &self.attachments)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn conversation() -> Conversation {
        Conversation {
            id: 1,
            company_id: 5,
            subcontractor_id: 5,
            last_message: None,
            last_message_at: None,
            company_unread: 2,
            subcontractor_unread: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn participants_are_matched_by_type_and_id() {
        let c = conversation();
        assert!(c.is_participant(ActorRef::company(5)));
        assert!(c.is_participant(ActorRef::subcontractor(5)));
        assert!(!c.is_participant(ActorRef::company(6)));
    }

    #[test]
    fn counterpart_is_the_other_side() {
        let c = conversation();
        assert_eq!(
            c.counterpart(ActorRef::company(5)),
            Some(ActorRef::subcontractor(5))
        );
        assert_eq!(c.counterpart(ActorRef::company(9)), None);
        assert_eq!(c.unread_for(ActorRef::company(5)), 2);
    }
}
