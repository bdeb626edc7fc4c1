use axum::routing::{get, post};
use axum::Router;

use crate::handlers::offers;
use crate::state::AppState;

/// Routes mounted at `/offers`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(offers::send_offer))
        .route("/sent", get(offers::list_sent_offers))
        .route("/received", get(offers::list_received_offers))
        .route("/{id}/accept", post(offers::accept))
        .route("/{id}/reject", post(offers::reject))
        .route("/{id}/withdraw", post(offers::withdraw))
}
