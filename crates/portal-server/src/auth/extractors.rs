use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use portal_types::AppError;

use super::jwt::Claims;
use super::session_role;
use crate::db::AppState;

/// Extractor that requires authentication. Returns 401 if no valid token.
pub struct AuthRequired(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for AuthRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthRequired)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// Extractor that optionally extracts auth claims. Never fails.
pub struct MaybeAuth(pub Option<Claims>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<Claims>().cloned()))
    }
}

/// Extractor for the admin screens. Returns 401 if unauthenticated and 403
/// unless the session's current role routes to the admin dashboard.
///
/// The role comes from the session cache (or a fresh cascade run), not from
/// the token, so removing someone from the admin group takes effect once
/// their cached role is cleared.
pub struct AdminRequired(pub Claims);

impl<S> FromRequestParts<S> for AdminRequired
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthRequired(claims) = AuthRequired::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);
        let resolution = session_role(&app_state, &claims).await;

        if !resolution.dashboard().is_admin() {
            tracing::info!(sub = %claims.sub, role = resolution.role(), "Admin access denied");
            return Err(AppError::forbidden("Admin role required"));
        }

        Ok(AdminRequired(claims))
    }
}
