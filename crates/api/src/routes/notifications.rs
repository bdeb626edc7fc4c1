use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /               list_notifications
/// GET    /unread         list_unread
/// GET    /unread-count   unread_count
/// POST   /read-all       mark_all_read
/// DELETE /{id}           delete_notification
/// POST   /{id}/read      mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/unread", get(notifications::list_unread))
        .route("/unread-count", get(notifications::unread_count))
        .route("/read-all", post(notifications::mark_all_read))
        .route("/{id}", delete(notifications::delete_notification))
        .route("/{id}/read", post(notifications::mark_read))
}
