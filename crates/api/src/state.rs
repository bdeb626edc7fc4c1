use std::sync::Arc;

use siteworks_db::store::{ConversationRepository, HiringStore, NotificationRepository};
use siteworks_events::{
    ChannelMembership, ConversationMembership, EventBus, NotificationDispatcher, PresenceRegistry,
};
use siteworks_lifecycle::{ChatService, LifecycleEngine};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. `None` with the in-memory store.
    pub pool: Option<siteworks_db::DbPool>,
    pub config: Arc<ServerConfig>,
    /// Job, application and offer transitions.
    pub engine: Arc<LifecycleEngine>,
    pub chat: Arc<ChatService>,
    /// Read side of the notification inbox.
    pub notifications: Arc<dyn NotificationRepository>,
    /// Live WebSocket connections and their channels.
    pub presence: Arc<PresenceRegistry>,
    /// Guards joins to conversation channels.
    pub membership: Arc<dyn ChannelMembership>,
}

impl AppState {
    /// Wire the services around one concrete store.
    ///
    /// Every service shares `store`; notifications raised by the engine and
    /// chat are published on `bus`.
    pub fn new<S>(
        store: Arc<S>,
        pool: Option<siteworks_db::DbPool>,
        config: Arc<ServerConfig>,
        bus: Arc<EventBus>,
        presence: Arc<PresenceRegistry>,
    ) -> Self
    where
        S: HiringStore + 'static,
    {
        let notifications: Arc<dyn NotificationRepository> = store.clone();
        let conversations: Arc<dyn ConversationRepository> = store.clone();
        let hiring: Arc<dyn HiringStore> = store;

        let dispatcher = Arc::new(
            NotificationDispatcher::new(Arc::clone(&notifications), bus)
                .with_write_attempts(config.notification_write_attempts),
        );
        let engine = Arc::new(LifecycleEngine::new(hiring, Arc::clone(&dispatcher)));
        let chat = Arc::new(ChatService::new(Arc::clone(&conversations), dispatcher));
        let membership: Arc<dyn ChannelMembership> =
            Arc::new(ConversationMembership::new(conversations));

        Self {
            pool,
            config,
            engine,
            chat,
            notifications,
            presence,
            membership,
        }
    }
}
