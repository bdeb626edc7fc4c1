//! Handlers for the `/offers` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use siteworks_core::types::DbId;
use siteworks_db::models::job::Job;
use siteworks_db::models::offer::{CreateOffer, Offer};

use crate::error::AppResult;
use crate::middleware::roles::{RequireCompany, RequireSubcontractor};
use crate::response::DataResponse;
use crate::state::AppState;

/// An offer together with the job it is for.
#[derive(Debug, Serialize)]
pub struct OfferWithJob {
    pub offer: Offer,
    pub job: Job,
    /// Set on accept: the accept filled the last slot and started the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_started: Option<bool>,
}

/// POST /api/v1/offers
///
/// Either references an existing request job (`job_id`) or carries a new
/// job (`job`) created together with the offer.
pub async fn send_offer(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Json(input): Json<CreateOffer>,
) -> AppResult<(StatusCode, Json<DataResponse<OfferWithJob>>)> {
    let (job, offer) = state.engine.send_offer(&auth.party(), &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: OfferWithJob {
                offer,
                job,
                job_started: None,
            },
        }),
    ))
}

/// GET /api/v1/offers/sent
pub async fn list_sent_offers(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Offer>>>> {
    let offers = state.engine.list_company_offers(auth.actor).await?;
    Ok(Json(DataResponse { data: offers }))
}

/// GET /api/v1/offers/received
pub async fn list_received_offers(
    RequireSubcontractor(auth): RequireSubcontractor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Offer>>>> {
    let offers = state.engine.list_my_offers(auth.actor).await?;
    Ok(Json(DataResponse { data: offers }))
}

/// POST /api/v1/offers/{id}/accept
pub async fn accept(
    RequireSubcontractor(auth): RequireSubcontractor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OfferWithJob>>> {
    let accepted = state.engine.accept_offer(&auth.party(), id).await?;
    Ok(Json(DataResponse {
        data: OfferWithJob {
            offer: accepted.offer,
            job: accepted.job,
            job_started: Some(accepted.job_started),
        },
    }))
}

/// POST /api/v1/offers/{id}/reject
pub async fn reject(
    RequireSubcontractor(auth): RequireSubcontractor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let offer = state.engine.reject_offer(&auth.party(), id).await?;
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/withdraw
pub async fn withdraw(
    RequireCompany(auth): RequireCompany,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let offer = state.engine.withdraw_offer(&auth.party(), id).await?;
    Ok(Json(DataResponse { data: offer }))
}
