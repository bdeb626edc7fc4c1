//! Siteworks live event plumbing.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, carrying [`LiveEvent`]s.
//! - [`NotificationDispatcher`]: durable notification write (with retry)
//!   followed by a publish on the bus.
//! - [`PresenceRegistry`]: live connections per actor and named channels.
//! - [`LiveRelay`]: background task pushing bus events to live connections.
//! - [`ConversationMembership`]: participant check guarding conversation
//!   channel joins.

pub mod bus;
pub mod dispatcher;
pub mod membership;
pub mod presence;
pub mod relay;

pub use bus::{EventBus, LiveEvent};
pub use dispatcher::NotificationDispatcher;
pub use membership::{ChannelMembership, ConversationMembership};
pub use presence::{JoinError, OutboundFrame, PresenceRegistry};
pub use relay::LiveRelay;
