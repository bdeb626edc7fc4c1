use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /                    create_job
/// GET    /mine                list_my_jobs
/// GET    /search              search_jobs
/// GET    /{id}                get_job
/// PUT    /{id}                update_job
/// DELETE /{id}                delete_job
/// POST   /{id}/start          start_job
/// GET    /{id}/applications   list_job_applications
/// GET    /{id}/offers         list_job_offers
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(jobs::create_job))
        .route("/mine", get(jobs::list_my_jobs))
        .route("/search", get(jobs::search_jobs))
        .route(
            "/{id}",
            get(jobs::get_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/{id}/start", post(jobs::start_job))
        .route("/{id}/applications", get(jobs::list_job_applications))
        .route("/{id}/offers", get(jobs::list_job_offers))
}
