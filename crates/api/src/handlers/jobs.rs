//! Handlers for the `/jobs` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use siteworks_core::hiring::{ApplicationStatus, Trade};
use siteworks_core::search::{JobSearch, Page};
use siteworks_core::types::{DbId, Timestamp};
use siteworks_db::models::application::JobApplication;
use siteworks_db::models::job::{CreateJob, Job, JobDetail, UpdateJob};
use siteworks_db::models::offer::Offer;

use crate::error::AppResult;
use crate::middleware::auth::AuthActor;
use crate::middleware::roles::RequireCompany;
use crate::response::{DataResponse, PagedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /jobs/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub trade: Option<Trade>,
    /// Upper end of the rate band; the band spans ten units below it.
    pub max_hourly_rate: Option<f64>,
    /// Case-insensitive substring of the site address.
    pub location: Option<String>,
    pub start_date: Option<Timestamp>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchQuery {
    fn into_search(self) -> JobSearch {
        JobSearch {
            trade: self.trade,
            max_hourly_rate: self.max_hourly_rate,
            location: self.location,
            start_date: self.start_date,
            page: Page::new(self.page, self.limit),
        }
    }
}

/// Query parameters for `GET /jobs/{id}/applications`.
#[derive(Debug, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
pub async fn create_job(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Json(input): Json<CreateJob>,
) -> AppResult<(StatusCode, Json<DataResponse<Job>>)> {
    let job = state.engine.create_job(&auth.party(), &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

/// GET /api/v1/jobs/mine
pub async fn list_my_jobs(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Job>>>> {
    let jobs = state.engine.list_company_jobs(auth.actor).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/search
///
/// Open request jobs with free capacity, newest first.
pub async fn search_jobs(
    _auth: AuthActor,
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<PagedResponse<Job>>> {
    let search = params.into_search();
    let (jobs, total) = state.engine.search_jobs(&search).await?;
    Ok(Json(PagedResponse {
        data: jobs,
        total,
        page: search.page.page,
        limit: search.page.limit,
        total_pages: search.page.total_pages(total),
    }))
}

/// GET /api/v1/jobs/{id}
///
/// The owning company also receives the job's applications and offers.
pub async fn get_job(
    auth: AuthActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JobDetail>>> {
    let detail = state.engine.get_job(auth.actor, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/jobs/{id}
pub async fn update_job(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateJob>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job = state.engine.update_job(&auth.party(), id, &input).await?;
    Ok(Json(DataResponse { data: job }))
}

/// DELETE /api/v1/jobs/{id}
///
/// Removes a pending job with its applications and offers. 204 on success.
pub async fn delete_job(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.engine.delete_job(&auth.party(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/{id}/start
pub async fn start_job(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job = state.engine.start_job(&auth.party(), id).await?;
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// Per-job listings
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}/applications
pub async fn list_job_applications(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(filter): Query<ApplicationFilter>,
) -> AppResult<Json<DataResponse<Vec<JobApplication>>>> {
    let applications = state
        .engine
        .list_job_applications(auth.actor, id, filter.status)
        .await?;
    Ok(Json(DataResponse { data: applications }))
}

/// GET /api/v1/jobs/{id}/offers
pub async fn list_job_offers(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Offer>>>> {
    let offers = state.engine.list_job_offers(auth.actor, id).await?;
    Ok(Json(DataResponse { data: offers }))
}
