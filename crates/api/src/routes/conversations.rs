use axum::routing::{get, post};
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;

/// Routes mounted at `/conversations`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(chat::list_conversations).post(chat::open_conversation),
        )
        .route("/messages", post(chat::send_first_message))
        .route(
            "/{id}/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route("/{id}/read", post(chat::mark_read))
}
