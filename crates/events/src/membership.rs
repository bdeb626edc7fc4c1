//! Conversation channel membership checks.

use std::sync::Arc;

use async_trait::async_trait;
use siteworks_core::actors::ActorRef;
use siteworks_core::types::DbId;
use siteworks_db::store::ConversationRepository;

/// Decides whether an actor may join a conversation channel.
#[async_trait]
pub trait ChannelMembership: Send + Sync {
    async fn is_participant(&self, actor: ActorRef, conversation_id: DbId) -> bool;
}

/// Membership backed by the stored conversation participants.
pub struct ConversationMembership {
    conversations: Arc<dyn ConversationRepository>,
}

impl ConversationMembership {
    pub fn new(conversations: Arc<dyn ConversationRepository>) -> Self {
        Self { conversations }
    }
}

#[async_trait]
impl ChannelMembership for ConversationMembership {
    async fn is_participant(&self, actor: ActorRef, conversation_id: DbId) -> bool {
        match self.conversations.find_conversation(conversation_id).await {
            Ok(Some(conversation)) => conversation.is_participant(actor),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    conversation_id,
                    "Failed to load conversation for membership check"
                );
                false
            }
        }
    }
}
