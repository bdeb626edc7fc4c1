//! Conversations between one company and one subcontractor.

use std::sync::Arc;

use chrono::Utc;
use siteworks_core::actors::{ActorRef, ActorType, Party};
use siteworks_core::types::DbId;
use siteworks_db::models::conversation::{Conversation, Message, SendFirstMessage, SendMessage};
use siteworks_db::store::ConversationRepository;
use siteworks_events::NotificationDispatcher;

use crate::{forbidden, not_found, notices, EngineResult};

/// Default and maximum page size for message history.
pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;
pub const MAX_MESSAGE_LIMIT: i64 = 200;

pub struct ChatService {
    conversations: Arc<dyn ConversationRepository>,
    notifier: Arc<NotificationDispatcher>,
}

impl ChatService {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            conversations,
            notifier,
        }
    }

    /// Load a conversation `actor` takes part in.
    async fn joined(&self, actor: ActorRef, id: DbId) -> EngineResult<Conversation> {
        let conversation = self
            .conversations
            .find_conversation(id)
            .await?
            .ok_or_else(|| not_found("Conversation", id))?;
        if !conversation.is_participant(actor) {
            return Err(forbidden("Not a participant of this conversation"));
        }
        Ok(conversation)
    }

    /// The conversation between `actor` and the counterpart of the opposite
    /// type, created on first use.
    pub async fn open_conversation(
        &self,
        actor: ActorRef,
        counterpart_id: DbId,
    ) -> EngineResult<Conversation> {
        let (company_id, subcontractor_id) = match actor.actor_type {
            ActorType::Company => (actor.id, counterpart_id),
            ActorType::Subcontractor => (counterpart_id, actor.id),
            ActorType::System => return Err(forbidden("System actors cannot chat")),
        };
        self.conversations
            .find_or_create_conversation(company_id, subcontractor_id)
            .await
    }

    pub async fn send_first_message(
        &self,
        sender: &Party,
        input: &SendFirstMessage,
    ) -> EngineResult<(Conversation, Message)> {
        input.validate()?;
        let conversation = self
            .open_conversation(sender.actor(), input.recipient_id)
            .await?;
        let message = self
            .deliver(sender, &conversation, &input.content, &input.attachments)
            .await?;
        Ok((conversation, message))
    }

    pub async fn send_message(&self, sender: &Party, input: &SendMessage) -> EngineResult<Message> {
        input.validate()?;
        let conversation = self.joined(sender.actor(), input.conversation_id).await?;
        self.deliver(sender, &conversation, &input.content, &input.attachments)
            .await
    }

    /// Persist the message, then notify the counterpart and the
    /// conversation channel.
    async fn deliver(
        &self,
        sender: &Party,
        conversation: &Conversation,
        content: &str,
        attachments: &[String],
    ) -> EngineResult<Message> {
        let Some(receiver) = conversation.counterpart(sender.actor()) else {
            return Err(forbidden("Not a participant of this conversation"));
        };
        let message = self
            .conversations
            .insert_message(
                conversation.id,
                sender.actor(),
                content.trim(),
                attachments,
                Utc::now(),
            )
            .await?;
        tracing::debug!(
            conversation_id = conversation.id,
            message_id = message.id,
            "Message sent"
        );

        self.notifier
            .dispatch_in(
                notices::new_message(&message, sender, receiver),
                Some(conversation.id),
            )
            .await;
        Ok(message)
    }

    pub async fn list_conversations(&self, actor: ActorRef) -> EngineResult<Vec<Conversation>> {
        self.conversations.list_conversations(actor).await
    }

    /// Message history, oldest first. `limit` is clamped to
    /// `1..=MAX_MESSAGE_LIMIT`.
    pub async fn list_messages(
        &self,
        actor: ActorRef,
        conversation_id: DbId,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<Message>> {
        self.joined(actor, conversation_id).await?;
        let limit = limit
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
            .clamp(1, MAX_MESSAGE_LIMIT);
        let skip = skip.unwrap_or(0).max(0);
        self.conversations
            .list_messages(conversation_id, limit, skip)
            .await
    }

    pub async fn mark_read(&self, actor: ActorRef, conversation_id: DbId) -> EngineResult<()> {
        self.joined(actor, conversation_id).await?;
        self.conversations
            .mark_conversation_read(conversation_id, actor)
            .await
    }
}
