//! Well-known presence channel names.
//!
//! Every authenticated connection is auto-joined to its actor channel and its
//! actor-type channel. Conversation channels are joined explicitly and only by
//! participants.

use crate::actors::{ActorRef, ActorType};
use crate::types::DbId;

/// Prefix of per-actor channels: `user:{actor_type}:{id}`.
pub const ACTOR_CHANNEL_PREFIX: &str = "user:";

/// Prefix of per-actor-type channels: `type:{actor_type}`.
pub const TYPE_CHANNEL_PREFIX: &str = "type:";

/// Prefix of conversation channels: `conversation:{id}`.
pub const CONVERSATION_CHANNEL_PREFIX: &str = "conversation:";

pub fn actor_channel(actor: ActorRef) -> String {
    format!("{ACTOR_CHANNEL_PREFIX}{}:{}", actor.actor_type, actor.id)
}

pub fn actor_type_channel(actor_type: ActorType) -> String {
    format!("{TYPE_CHANNEL_PREFIX}{actor_type}")
}

pub fn conversation_channel(conversation_id: DbId) -> String {
    format!("{CONVERSATION_CHANNEL_PREFIX}{conversation_id}")
}

/// Extract the conversation id from a `conversation:{id}` channel name.
pub fn parse_conversation_channel(channel: &str) -> Option<DbId> {
    channel
        .strip_prefix(CONVERSATION_CHANNEL_PREFIX)
        .and_then(|id| id.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_channels_include_type() {
        assert_eq!(actor_channel(ActorRef::company(7)), "user:company:7");
        assert_eq!(actor_type_channel(ActorType::Subcontractor), "type:subcontractor");
    }

    #[test]
    fn conversation_channel_parses_back() {
        let name = conversation_channel(42);
        assert_eq!(parse_conversation_channel(&name), Some(42));
        assert_eq!(parse_conversation_channel("conversation:abc"), None);
        assert_eq!(parse_conversation_channel("user:company:42"), None);
    }
}
