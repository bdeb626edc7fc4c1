//! Socket message protocol.
//!
//! Every text frame, both directions, is `{ "event": <name>, "data": ... }`.
//! Inbound events are dispatched by name:
//!
//! | Event       | Data               | Reply                              |
//! |-------------|--------------------|------------------------------------|
//! | `joinRoom`  | `{ "room": "..." }` | `joinRoom` ack, or `error`         |
//! | `leaveRoom` | `{ "room": "..." }` | `leaveRoom` ack                    |
//! | `ping`      | anything           | `pong` with a server timestamp     |

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use siteworks_core::actors::ActorRef;
use siteworks_events::{ChannelMembership, OutboundFrame, PresenceRegistry};

#[derive(Debug, Deserialize)]
struct Inbound {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RoomRequest {
    room: String,
}

/// Frame sent right after a token is accepted.
pub fn connected_frame(actor: ActorRef) -> OutboundFrame {
    OutboundFrame::event(
        "connected",
        json!({
            "message": "Successfully connected",
            "actorId": actor.id,
            "actorType": actor.actor_type,
        }),
    )
}

pub fn error_frame(message: impl Into<String>) -> OutboundFrame {
    OutboundFrame::event("error", json!({ "message": message.into() }))
}

/// Handle one inbound text frame. Returns the reply to send, if any.
pub async fn dispatch(
    text: &str,
    conn_id: &str,
    presence: &PresenceRegistry,
    membership: &dyn ChannelMembership,
) -> Option<OutboundFrame> {
    let inbound: Inbound = match serde_json::from_str(text) {
        Ok(inbound) => inbound,
        Err(_) => return Some(error_frame("Malformed message")),
    };

    match inbound.event.as_str() {
        "joinRoom" => {
            let Some(room) = room_of(inbound.data) else {
                return Some(error_frame("joinRoom requires a room"));
            };
            match presence.join_channel(conn_id, &room, membership).await {
                Ok(()) => Some(OutboundFrame::event(
                    "joinRoom",
                    json!({ "success": true, "room": room }),
                )),
                Err(e) => {
                    tracing::debug!(conn_id, room = %room, error = %e, "Join refused");
                    Some(error_frame(e.to_string()))
                }
            }
        }
        "leaveRoom" => {
            let Some(room) = room_of(inbound.data) else {
                return Some(error_frame("leaveRoom requires a room"));
            };
            let left = presence.leave_channel(conn_id, &room).await;
            Some(OutboundFrame::event(
                "leaveRoom",
                json!({ "success": left, "room": room }),
            ))
        }
        "ping" => Some(OutboundFrame::event(
            "pong",
            json!({ "timestamp": Utc::now() }),
        )),
        other => {
            tracing::trace!(conn_id, event = other, "Ignoring unknown event");
            None
        }
    }
}

fn room_of(data: serde_json::Value) -> Option<String> {
    serde_json::from_value::<RoomRequest>(data)
        .ok()
        .map(|r| r.room)
}
