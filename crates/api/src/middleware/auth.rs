//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use siteworks_core::actors::{ActorRef, ActorType, Party};
use siteworks_core::error::CoreError;

use crate::auth::jwt::{validate_token, Claims, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated actor extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// ```ignore
/// async fn my_handler(auth: AuthActor) -> AppResult<Json<()>> {
///     tracing::info!(actor = %auth.actor, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthActor {
    pub actor: ActorRef,
    /// Display name carried by the token, if any.
    pub name: Option<String>,
}

impl AuthActor {
    /// The actor as the sender of notifications.
    pub fn party(&self) -> Party {
        Party::new(self.actor, self.name.clone())
    }
}

/// Validate `token` and turn its claims into an [`AuthActor`].
///
/// System tokens are refused: the system actor never authenticates.
pub fn authenticate(token: &str, config: &JwtConfig) -> Result<AuthActor, AppError> {
    let claims: Claims = validate_token(token, config)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    if claims.actor_type == ActorType::System {
        return Err(AppError::Core(CoreError::Unauthorized(
            "System tokens are not accepted".into(),
        )));
    }

    Ok(AuthActor {
        actor: claims.actor(),
        name: claims.name,
    })
}

/// The token part of a `Bearer <token>` header value.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

impl FromRequestParts<AppState> for AuthActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        authenticate(token, &state.config.jwt)
    }
}
