pub mod applications;
pub mod conversations;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod offers;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (token via ?token= or Bearer)
///
/// /jobs                                create (company)
/// /jobs/mine                           list own jobs (company)
/// /jobs/search                         available request jobs (paginated)
/// /jobs/{id}                           get, update, delete
/// /jobs/{id}/start                     start now (POST)
/// /jobs/{id}/applications              applications on a job (owner)
/// /jobs/{id}/offers                    offers on a job (owner)
///
/// /applications                        apply (subcontractor)
/// /applications/mine                   own applications (subcontractor)
/// /applications/{id}/accept            accept (company)
/// /applications/{id}/reject            reject (company)
/// /applications/{id}/withdraw          withdraw (subcontractor)
///
/// /offers                              send (company)
/// /offers/sent                         offers sent (company)
/// /offers/received                     offers received (subcontractor)
/// /offers/{id}/accept                  accept (subcontractor)
/// /offers/{id}/reject                  reject (subcontractor)
/// /offers/{id}/withdraw                withdraw (company)
///
/// /notifications                       list (paginated, ?unread_only=)
/// /notifications/unread                unread only (paginated)
/// /notifications/unread-count          unread count
/// /notifications/read-all              mark all read (POST)
/// /notifications/{id}                  delete
/// /notifications/{id}/read             mark one read (POST)
///
/// /conversations                       list, find-or-create
/// /conversations/messages              send first message (POST)
/// /conversations/{id}/messages         history, send
/// /conversations/{id}/read             mark read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        .nest("/jobs", jobs::router())
        .nest("/applications", applications::router())
        .nest("/offers", offers::router())
        .nest("/notifications", notifications::router())
        .nest("/conversations", conversations::router())
}
