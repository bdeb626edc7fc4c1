//! Live connection registry.
//!
//! Tracks every live connection, the actor it belongs to (if authenticated)
//! and the named channels it has joined. It is transport-neutral: each
//! connection owns an unbounded queue of [`OutboundFrame`]s that the socket
//! task drains. Nothing here is persisted.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use siteworks_core::actors::{ActorRef, ActorType};
use siteworks_core::channels::{actor_channel, actor_type_channel, parse_conversation_channel};
use siteworks_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

use crate::membership::ChannelMembership;

/// Sender half for pushing frames to one connection.
pub type FrameSender = mpsc::UnboundedSender<OutboundFrame>;

/// A frame queued for a live connection.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// Named JSON event, sent as `{ "event": ..., "data": ... }`.
    Event {
        event: String,
        data: serde_json::Value,
    },
    /// Transport-level keepalive.
    Ping,
    /// Ask the client to close.
    Close,
}

#[derive(Serialize)]
struct EventEnvelope<'a> {
    event: &'a str,
    data: &'a serde_json::Value,
}

impl OutboundFrame {
    pub fn event(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self::Event {
            event: event.into(),
            data,
        }
    }

    /// JSON text of an `Event` frame; `None` for control frames.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Event { event, data } => serde_json::to_string(&EventEnvelope { event, data }).ok(),
            Self::Ping | Self::Close => None,
        }
    }
}

/// Why a channel join was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Unknown connection")]
    UnknownConnection,

    #[error("Authentication required")]
    Anonymous,

    #[error("Channel cannot be joined: {0}")]
    NotJoinable(String),

    #[error("Not a participant of {0}")]
    NotParticipant(String),
}

struct Connection {
    actor: Option<ActorRef>,
    channels: HashSet<String>,
    sender: FrameSender,
    connected_at: Timestamp,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<String, Connection>,
    /// channel name -> connection ids
    channels: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn join(&mut self, conn_id: &str, channel: String) {
        if let Some(conn) = self.connections.get_mut(conn_id) {
            conn.channels.insert(channel.clone());
            self.channels
                .entry(channel)
                .or_default()
                .insert(conn_id.to_string());
        }
    }

    fn leave(&mut self, conn_id: &str, channel: &str) -> bool {
        let Some(conn) = self.connections.get_mut(conn_id) else {
            return false;
        };
        if !conn.channels.remove(channel) {
            return false;
        }
        if let Some(members) = self.channels.get_mut(channel) {
            members.remove(conn_id);
            if members.is_empty() {
                self.channels.remove(channel);
            }
        }
        true
    }

    fn members(&self, channel: &str) -> impl Iterator<Item = &String> {
        self.channels.get(channel).into_iter().flatten()
    }
}

/// Registry of live connections and channel membership.
///
/// Thread-safe via interior `RwLock`; shared as `Arc<PresenceRegistry>`.
/// An actor may hold any number of connections; each is auto-joined to
/// `user:{type}:{id}` and `type:{type}` on connect.
pub struct PresenceRegistry {
    inner: RwLock<Inner>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Register a connection. Returns the receiver the socket task drains.
    pub async fn connect(
        &self,
        conn_id: String,
        actor: Option<ActorRef>,
    ) -> mpsc::UnboundedReceiver<OutboundFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.write().await;
        inner.connections.insert(
            conn_id.clone(),
            Connection {
                actor,
                channels: HashSet::new(),
                sender: tx,
                connected_at: chrono::Utc::now(),
            },
        );
        if let Some(actor) = actor {
            inner.join(&conn_id, actor_channel(actor));
            inner.join(&conn_id, actor_type_channel(actor.actor_type));
        }
        rx
    }

    /// Remove a connection and all of its channel memberships. The actor's
    /// other connections are untouched.
    pub async fn disconnect(&self, conn_id: &str) {
        let mut inner = self.inner.write().await;
        let channels: Vec<String> = match inner.connections.get(conn_id) {
            Some(conn) => conn.channels.iter().cloned().collect(),
            None => return,
        };
        for channel in &channels {
            inner.leave(conn_id, channel);
        }
        if let Some(conn) = inner.connections.remove(conn_id) {
            let seconds = (chrono::Utc::now() - conn.connected_at).num_seconds();
            tracing::debug!(conn_id, seconds, "Connection removed");
        }
    }

    pub async fn actor_of(&self, conn_id: &str) -> Option<ActorRef> {
        self.inner
            .read()
            .await
            .connections
            .get(conn_id)
            .and_then(|c| c.actor)
    }

    pub async fn is_online(&self, actor: ActorRef) -> bool {
        self.inner
            .read()
            .await
            .members(&actor_channel(actor))
            .next()
            .is_some()
    }

    /// Number of live connections held by `actor`.
    pub async fn connections_of(&self, actor: ActorRef) -> usize {
        self.inner.read().await.members(&actor_channel(actor)).count()
    }

    /// Distinct online actors of one type.
    pub async fn online_actors(&self, actor_type: ActorType) -> Vec<ActorRef> {
        let inner = self.inner.read().await;
        let mut actors: Vec<ActorRef> = inner
            .members(&actor_type_channel(actor_type))
            .filter_map(|id| inner.connections.get(id).and_then(|c| c.actor))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        actors.sort_by_key(|a| a.id);
        actors
    }

    /// Send to every connection of `actor`. Returns the number reached.
    pub async fn send_to(&self, actor: ActorRef, frame: OutboundFrame) -> usize {
        self.broadcast_to_channel(&actor_channel(actor), frame).await
    }

    /// Queue a frame on one connection only (replies to that socket).
    pub async fn send_to_connection(&self, conn_id: &str, frame: OutboundFrame) -> bool {
        let inner = self.inner.read().await;
        inner
            .connections
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(frame).is_ok())
    }

    /// Send to every member of `channel`. Returns the number reached.
    pub async fn broadcast_to_channel(&self, channel: &str, frame: OutboundFrame) -> usize {
        self.deliver(&[channel.to_string()], frame).await
    }

    /// Send once to every connection in the union of `channels`.
    pub async fn deliver(&self, channels: &[String], frame: OutboundFrame) -> usize {
        let inner = self.inner.read().await;
        let targets: HashSet<&String> = channels
            .iter()
            .flat_map(|channel| inner.members(channel))
            .collect();
        let mut count = 0;
        for conn_id in targets {
            if let Some(conn) = inner.connections.get(conn_id) {
                // A closed queue means the socket task is winding down.
                if conn.sender.send(frame.clone()).is_ok() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Join an explicit channel. Only conversation channels can be joined,
    /// and only by an authenticated participant.
    pub async fn join_channel(
        &self,
        conn_id: &str,
        channel: &str,
        membership: &dyn ChannelMembership,
    ) -> Result<(), JoinError> {
        let actor = {
            let inner = self.inner.read().await;
            let conn = inner
                .connections
                .get(conn_id)
                .ok_or(JoinError::UnknownConnection)?;
            conn.actor.ok_or(JoinError::Anonymous)?
        };

        let conversation_id = parse_conversation_channel(channel)
            .ok_or_else(|| JoinError::NotJoinable(channel.to_string()))?;
        if !membership.is_participant(actor, conversation_id).await {
            return Err(JoinError::NotParticipant(channel.to_string()));
        }

        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(conn_id) {
            return Err(JoinError::UnknownConnection);
        }
        inner.join(conn_id, channel.to_string());
        tracing::debug!(conn_id, channel, actor = %actor, "Joined channel");
        Ok(())
    }

    /// Leave an explicitly joined channel. Actor channels cannot be left.
    pub async fn leave_channel(&self, conn_id: &str, channel: &str) -> bool {
        if parse_conversation_channel(channel).is_none() {
            return false;
        }
        self.inner.write().await.leave(conn_id, channel)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Queue a ping on every connection.
    pub async fn ping_all(&self) {
        let inner = self.inner.read().await;
        for conn in inner.connections.values() {
            let _ = conn.sender.send(OutboundFrame::Ping);
        }
    }

    /// Queue a close on every connection, then forget them all.
    pub async fn shutdown_all(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.connections.len();
        for conn in inner.connections.values() {
            let _ = conn.sender.send(OutboundFrame::Close);
        }
        inner.connections.clear();
        inner.channels.clear();
        tracing::info!(count, "Closed all live connections");
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use siteworks_core::channels::conversation_channel;
    use siteworks_core::types::DbId;

    use super::*;

    /// Conversation 1 joins company 1 and subcontractor 2.
    struct OneConversation;

    #[async_trait]
    impl ChannelMembership for OneConversation {
        async fn is_participant(&self, actor: ActorRef, conversation_id: DbId) -> bool {
            conversation_id == 1
                && (actor == ActorRef::company(1) || actor == ActorRef::subcontractor(2))
        }
    }

    fn frame() -> OutboundFrame {
        OutboundFrame::event("offerReceived", serde_json::json!({"id": 1}))
    }

    #[tokio::test]
    async fn actor_with_two_connections_receives_on_both() {
        let registry = PresenceRegistry::new();
        let sub = ActorRef::subcontractor(2);
        let mut a = registry.connect("a".into(), Some(sub)).await;
        let mut b = registry.connect("b".into(), Some(sub)).await;

        assert_eq!(registry.send_to(sub, frame()).await, 2);
        assert_eq!(a.recv().await, Some(frame()));
        assert_eq!(b.recv().await, Some(frame()));

        registry.disconnect("a").await;
        assert!(registry.is_online(sub).await);
        assert_eq!(registry.connections_of(sub).await, 1);
        assert_eq!(registry.send_to(sub, frame()).await, 1);

        registry.disconnect("b").await;
        assert!(!registry.is_online(sub).await);
    }

    #[tokio::test]
    async fn same_id_other_type_is_not_reached() {
        let registry = PresenceRegistry::new();
        let _rx = registry.connect("c".into(), Some(ActorRef::company(2))).await;
        assert_eq!(registry.send_to(ActorRef::subcontractor(2), frame()).await, 0);
    }

    #[tokio::test]
    async fn send_to_connection_reaches_only_that_socket() {
        let registry = PresenceRegistry::new();
        let sub = ActorRef::subcontractor(2);
        let mut a = registry.connect("a".into(), Some(sub)).await;
        let mut b = registry.connect("b".into(), Some(sub)).await;

        assert!(registry.send_to_connection("a", frame()).await);
        assert!(!registry.send_to_connection("missing", frame()).await);
        assert_eq!(a.recv().await, Some(frame()));
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn sending_to_offline_actor_is_a_no_op() {
        let registry = PresenceRegistry::new();
        assert_eq!(registry.send_to(ActorRef::company(9), frame()).await, 0);
    }

    #[tokio::test]
    async fn only_participants_join_conversation_channels() {
        let registry = PresenceRegistry::new();
        let _c = registry.connect("c".into(), Some(ActorRef::company(1))).await;
        let _s = registry.connect("s".into(), Some(ActorRef::subcontractor(3))).await;
        let _anon = registry.connect("anon".into(), None).await;
        let channel = conversation_channel(1);

        assert!(registry.join_channel("c", &channel, &OneConversation).await.is_ok());
        assert_matches!(
            registry.join_channel("s", &channel, &OneConversation).await,
            Err(JoinError::NotParticipant(_))
        );
        assert_matches!(
            registry.join_channel("anon", &channel, &OneConversation).await,
            Err(JoinError::Anonymous)
        );
        assert_matches!(
            registry.join_channel("c", "user:subcontractor:3", &OneConversation).await,
            Err(JoinError::NotJoinable(_))
        );
        assert_eq!(registry.broadcast_to_channel(&channel, frame()).await, 1);
    }

    #[tokio::test]
    async fn deliver_dedupes_overlapping_channels() {
        let registry = PresenceRegistry::new();
        let company = ActorRef::company(1);
        let mut rx = registry.connect("c".into(), Some(company)).await;
        let channel = conversation_channel(1);
        registry.join_channel("c", &channel, &OneConversation).await.unwrap();

        let reached = registry
            .deliver(&[actor_channel(company), channel.clone()], frame())
            .await;
        assert_eq!(reached, 1);
        assert_eq!(rx.recv().await, Some(frame()));
        assert!(rx.try_recv().is_err());

        assert!(registry.leave_channel("c", &channel).await);
        assert!(!registry.leave_channel("c", &actor_channel(company)).await);
        assert_eq!(registry.broadcast_to_channel(&channel, frame()).await, 0);
    }

    #[tokio::test]
    async fn online_actors_are_distinct() {
        let registry = PresenceRegistry::new();
        let _a = registry.connect("a".into(), Some(ActorRef::company(4))).await;
        let _b = registry.connect("b".into(), Some(ActorRef::company(4))).await;
        let _c = registry.connect("c".into(), Some(ActorRef::company(1))).await;
        let _d = registry.connect("d".into(), Some(ActorRef::subcontractor(4))).await;

        assert_eq!(
            registry.online_actors(ActorType::Company).await,
            vec![ActorRef::company(1), ActorRef::company(4)]
        );
    }

    #[tokio::test]
    async fn shutdown_closes_every_connection() {
        let registry = PresenceRegistry::new();
        let mut rx = registry.connect("a".into(), None).await;
        registry.ping_all().await;
        registry.shutdown_all().await;

        assert_eq!(rx.recv().await, Some(OutboundFrame::Ping));
        assert_eq!(rx.recv().await, Some(OutboundFrame::Close));
        assert_eq!(registry.connection_count().await, 0);
    }

    #[test]
    fn event_frame_serializes_as_envelope() {
        let text = frame().to_text().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "offerReceived");
        assert_eq!(value["data"]["id"], 1);
        assert!(OutboundFrame::Ping.to_text().is_none());
    }
}
