use std::sync::Arc;
use std::time::Duration;

use siteworks_events::PresenceRegistry;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that queues a Ping frame on every live
/// connection.
///
/// The task loops forever; `main` aborts the returned handle on shutdown.
pub fn start_heartbeat(presence: Arc<PresenceRegistry>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = presence.connection_count().await;
            tracing::debug!(count, "WebSocket heartbeat ping");
            presence.ping_all().await;
        }
    })
}
