//! Handlers for the `/applications` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use siteworks_core::types::DbId;
use siteworks_db::models::application::{CreateApplication, JobApplication};
use siteworks_db::models::job::Job;

use crate::error::AppResult;
use crate::middleware::roles::{RequireCompany, RequireSubcontractor};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a successful accept.
#[derive(Debug, Serialize)]
pub struct AcceptApplicationResponse {
    pub application: JobApplication,
    pub job: Job,
    /// Ids of the pending applications rejected by this accept.
    pub auto_rejected: Vec<DbId>,
    pub job_started: bool,
}

/// POST /api/v1/applications
pub async fn apply(
    RequireSubcontractor(auth): RequireSubcontractor,
    State(state): State<AppState>,
    Json(input): Json<CreateApplication>,
) -> AppResult<(StatusCode, Json<DataResponse<JobApplication>>)> {
    let application = state.engine.apply_to_job(&auth.party(), &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: application })))
}

/// GET /api/v1/applications/mine
pub async fn list_my_applications(
    RequireSubcontractor(auth): RequireSubcontractor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<JobApplication>>>> {
    let applications = state.engine.list_my_applications(auth.actor).await?;
    Ok(Json(DataResponse { data: applications }))
}

/// POST /api/v1/applications/{id}/accept
pub async fn accept(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AcceptApplicationResponse>>> {
    let accepted = state.engine.accept_application(&auth.party(), id).await?;
    Ok(Json(DataResponse {
        data: AcceptApplicationResponse {
            application: accepted.application,
            job: accepted.job,
            auto_rejected: accepted.auto_rejected.iter().map(|a| a.id).collect(),
            job_started: accepted.job_started,
        },
    }))
}

/// POST /api/v1/applications/{id}/reject
pub async fn reject(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JobApplication>>> {
    let application = state.engine.reject_application(&auth.party(), id).await?;
    Ok(Json(DataResponse { data: application }))
}

/// POST /api/v1/applications/{id}/withdraw
pub async fn withdraw(
    RequireSubcontractor(auth): RequireSubcontractor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JobApplication>>> {
    let application = state.engine.withdraw_application(&auth.party(), id).await?;
    Ok(Json(DataResponse { data: application }))
}
