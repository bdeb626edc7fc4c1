use axum::routing::{get, post};
use axum::Router;

use crate::handlers::applications;
use crate::state::AppState;

/// Routes mounted at `/applications`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(applications::apply))
        .route("/mine", get(applications::list_my_applications))
        .route("/{id}/accept", post(applications::accept))
        .route("/{id}/reject", post(applications::reject))
        .route("/{id}/withdraw", post(applications::withdraw))
}
