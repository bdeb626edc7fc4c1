//! Handlers for the `/notifications` resource.
//!
//! Every endpoint is scoped to the authenticated actor's own inbox.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use siteworks_core::error::CoreError;
use siteworks_core::search::Page;
use siteworks_core::types::DbId;
use siteworks_db::models::notification::{Notification, NotificationPage};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthActor;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 20, capped at 100.
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

async fn load_page(
    state: &AppState,
    auth: &AuthActor,
    unread_only: bool,
    page: Page,
) -> AppResult<NotificationPage> {
    let (notifications, total) = state
        .notifications
        .list_notifications(auth.actor, unread_only, page)
        .await?;
    Ok(NotificationPage {
        notifications,
        total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
    })
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
pub async fn list_notifications(
    auth: AuthActor,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<NotificationPage>>> {
    let page = Page::new(params.page, params.limit);
    let unread_only = params.unread_only.unwrap_or(false);
    let data = load_page(&state, &auth, unread_only, page).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/notifications/unread
pub async fn list_unread(
    auth: AuthActor,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<NotificationPage>>> {
    let page = Page::new(params.page, params.limit);
    let data = load_page(&state, &auth, true, page).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthActor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = state
        .notifications
        .unread_notification_count(auth.actor)
        .await?;
    Ok(Json(DataResponse {
        data: UnreadCount { count },
    }))
}

// ---------------------------------------------------------------------------
// Read state
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/{id}/read
///
/// 404 when the notification does not belong to the caller.
pub async fn mark_read(
    auth: AuthActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Notification>>> {
    let notification = state
        .notifications
        .mark_notification_read(id, auth.actor)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }))?;
    Ok(Json(DataResponse { data: notification }))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthActor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let updated = state
        .notifications
        .mark_all_notifications_read(auth.actor)
        .await?;
    tracing::debug!(actor = %auth.actor, updated, "Marked all notifications read");
    Ok(Json(DataResponse {
        data: MarkedRead { updated },
    }))
}

/// DELETE /api/v1/notifications/{id}
pub async fn delete_notification(
    auth: AuthActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = state
        .notifications
        .delete_notification(id, auth.actor)
        .await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}
