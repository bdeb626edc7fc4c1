//! WebSocket gateway for live notifications.
//!
//! Provides the HTTP upgrade handler, inbound event dispatch and the
//! heartbeat task. Connection bookkeeping lives in
//! [`siteworks_events::PresenceRegistry`].

mod handler;
mod heartbeat;
pub mod protocol;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
