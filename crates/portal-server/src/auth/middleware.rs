use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::jwt::{self, hash_token, validate_access_token, validate_refresh_token, Claims};
use super::{cookies, session_role};
use crate::db::AppState;
use crate::repo;

/// Permissive auth middleware.
///
/// On each request:
/// 1. Validates the access token from cookies (or Bearer header fallback)
///    and inserts its [`Claims`] into the request extensions. A token whose
///    session has ended is treated as invalid.
/// 2. If the access token is missing or invalid, rotates the refresh cookie
///    into a fresh token pair for the same session and sets new cookies.
///
/// Does NOT reject unauthenticated requests; extractors decide authorization.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let access_claims = cookies::extract_access_token(req.headers())
        .and_then(|token| validate_access_token(&token).ok())
        .filter(|claims| state.sessions.contains(&claims.sid));

    let mut rotated: Option<(String, String)> = None;
    match access_claims {
        Some(claims) => {
            req.extensions_mut().insert(claims);
        }
        None => {
            if let Some(refresh_token) = cookies::extract_refresh_token(req.headers()) {
                if let Some((claims, access, refresh)) =
                    try_transparent_refresh(&state, &refresh_token).await
                {
                    req.extensions_mut().insert(claims);
                    rotated = Some((access, refresh));
                }
            }
        }
    }

    let mut response = next.run(req).await;

    if let Some((access, refresh)) = rotated {
        cookies::set_auth_cookies(response.headers_mut(), &access, &refresh);
    }

    response
}

/// Exchange a refresh token for a new access/refresh pair on the same
/// session. The old refresh token is revoked; a revoked, expired or unknown
/// token yields `None`.
///
/// The session is re-registered if the process no longer holds it, and the
/// role in the new tokens comes from the session's resolved role, not the
/// old token.
async fn try_transparent_refresh(
    state: &AppState,
    refresh_token: &str,
) -> Option<(Claims, String, String)> {
    let claims = validate_refresh_token(refresh_token).ok()?;
    let user_id = claims.user_id()?;

    match repo::refresh_token::consume(&state.pool, &hash_token(refresh_token), user_id).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(sid = %claims.sid, "Refresh token rejected");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Refresh token lookup failed");
            return None;
        }
    }

    state.sessions.resume(&claims.sid);
    let resolution = session_role(state, &claims).await;
    let role = resolution.role();

    let new_access = jwt::create_access_token(user_id, &claims.email, role, &claims.sid).ok()?;
    let (new_refresh, expires_at) =
        jwt::create_refresh_token(user_id, &claims.email, role, &claims.sid).ok()?;

    if let Err(e) = repo::refresh_token::store(
        &state.pool,
        user_id,
        &claims.sid,
        &hash_token(&new_refresh),
        expires_at,
    )
    .await
    {
        tracing::warn!(error = %e, "Failed to store rotated refresh token");
        return None;
    }

    let new_claims = validate_access_token(&new_access).ok()?;
    tracing::debug!(sid = %new_claims.sid, "Session refreshed");
    Some((new_claims, new_access, new_refresh))
}
