use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use siteworks_core::actors::ActorRef;
use siteworks_events::OutboundFrame;

use crate::middleware::auth::{authenticate, bearer_token};
use crate::state::AppState;
use crate::ws::protocol;

/// Handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The token comes from `?token=` or an `Authorization: Bearer` header. A
/// missing or invalid token still upgrades; the connection stays anonymous
/// and only an invalid token earns an `error` frame.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = query
        .token
        .or_else(|| bearer_token(&headers).map(str::to_string));

    let (actor, greeting) = match token {
        None => (None, None),
        Some(token) => match authenticate(&token, &state.config.jwt) {
            Ok(auth) => (Some(auth.actor), Some(protocol::connected_frame(auth.actor))),
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket authentication failed");
                (None, Some(protocol::error_frame("Authentication failed")))
            }
        },
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, actor, greeting))
}

fn to_message(frame: &OutboundFrame) -> Option<Message> {
    match frame {
        OutboundFrame::Event { .. } => frame.to_text().map(|t| Message::Text(t.into())),
        OutboundFrame::Ping => Some(Message::Ping(Default::default())),
        OutboundFrame::Close => Some(Message::Close(None)),
    }
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with the presence registry.
///   2. Spawns a sender task that forwards queued frames to the sink.
///   3. Dispatches inbound events on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    actor: Option<ActorRef>,
    greeting: Option<OutboundFrame>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    match actor {
        Some(actor) => tracing::info!(conn_id = %conn_id, actor = %actor, "WebSocket connected"),
        None => tracing::info!(conn_id = %conn_id, "WebSocket connected without identity"),
    }

    let presence = state.presence.clone();
    let mut rx = presence.connect(conn_id.clone(), actor).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: greeting first, then everything queued for this connection.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        if let Some(message) = greeting.as_ref().and_then(to_message) {
            if sink.send(message).await.is_err() {
                return;
            }
        }
        while let Some(frame) = rx.recv().await {
            let Some(message) = to_message(&frame) else {
                continue;
            };
            let closing = matches!(frame, OutboundFrame::Close);
            if sink.send(message).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Receiver loop: dispatch inbound events, replies go through the queue.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = protocol::dispatch(
                    text.as_str(),
                    &conn_id,
                    &presence,
                    state.membership.as_ref(),
                )
                .await;
                if let Some(frame) = reply {
                    presence.send_to_connection(&conn_id, frame).await;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    presence.disconnect(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
