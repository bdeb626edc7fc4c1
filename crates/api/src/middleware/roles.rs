//! Actor-type extractors.
//!
//! Each extractor wraps [`AuthActor`] and rejects tokens of the wrong actor
//! type with 403. The lifecycle engine re-checks ownership; these only keep
//! obviously misdirected requests away from it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use siteworks_core::actors::ActorType;
use siteworks_core::error::CoreError;

use super::auth::AuthActor;
use crate::error::AppError;
use crate::state::AppState;

async fn require(
    parts: &mut Parts,
    state: &AppState,
    actor_type: ActorType,
    message: &str,
) -> Result<AuthActor, AppError> {
    let auth = AuthActor::from_request_parts(parts, state).await?;
    if auth.actor.actor_type != actor_type {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(auth)
}

/// Requires a company token.
///
/// ```ignore
/// async fn company_only(RequireCompany(auth): RequireCompany) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireCompany(pub AuthActor);

impl FromRequestParts<AppState> for RequireCompany {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, ActorType::Company, "Company account required")
            .await
            .map(RequireCompany)
    }
}

/// Requires a subcontractor token.
pub struct RequireSubcontractor(pub AuthActor);

impl FromRequestParts<AppState> for RequireSubcontractor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(
            parts,
            state,
            ActorType::Subcontractor,
            "Subcontractor account required",
        )
        .await
        .map(RequireSubcontractor)
    }
}
