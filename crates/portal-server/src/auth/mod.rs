pub mod cookies;
pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;

use portal_types::{AppError, AuthUser, RoleResolution};

use crate::db::AppState;
use crate::roles::resolve_role;

/// Resolve the role for an authenticated request through its session cache.
///
/// The cached role is served while the session holds one, so a cache clear
/// or a new login is what makes a membership change take effect.
pub async fn session_role(state: &AppState, claims: &jwt::Claims) -> RoleResolution {
    resolve_role(
        &state.directory(),
        &state.sessions.cache(&claims.sid),
        &state.overrides,
        Some(&claims.sub),
        Some(&claims.email),
    )
    .await
}

/// A freshly opened login session.
pub struct IssuedSession {
    pub resolution: RoleResolution,
    pub access_token: String,
    pub refresh_token: String,
}

/// Open a session for an authenticated identity: allocate a session id,
/// resolve the role into that session's cache, issue a token pair carrying
/// the role and session id, and persist the refresh token hash.
pub async fn open_session(state: &AppState, user: &AuthUser) -> Result<IssuedSession, AppError> {
    let sid = state.sessions.open();
    let cache = state.sessions.cache(&sid);
    let user_id = user.id.to_string();

    let resolution = resolve_role(
        &state.directory(),
        &cache,
        &state.overrides,
        Some(&user_id),
        Some(&user.email),
    )
    .await;

    let token_error = |e: jsonwebtoken::errors::Error| {
        tracing::error!(error = %e, "Failed to sign token");
        AppError::internal("Failed to issue session tokens")
    };
    let access_token =
        jwt::create_access_token(user.id, &user.email, resolution.role(), &sid).map_err(token_error)?;
    let (refresh_token, expires_at) =
        jwt::create_refresh_token(user.id, &user.email, resolution.role(), &sid).map_err(token_error)?;

    crate::repo::refresh_token::store(
        &state.pool,
        user.id,
        &sid,
        &jwt::hash_token(&refresh_token),
        expires_at,
    )
    .await?;

    tracing::info!(user_id = %user.id, sid = %sid, role = resolution.role(), "Session opened");
    Ok(IssuedSession {
        resolution,
        access_token,
        refresh_token,
    })
}
