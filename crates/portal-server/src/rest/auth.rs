use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use portal_types::{AppError, AuthResponse, AuthUser, LoginRequest, RegisterRequest, SessionUser};

use crate::auth::extractors::{AuthRequired, MaybeAuth};
use crate::auth::{cookies, open_session, password, session_role, IssuedSession};
use crate::db::AppState;
use crate::error_convert::ValidateRequest;
use crate::repo;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn session_response(user: AuthUser, session: IssuedSession) -> (HeaderMap, Json<AuthResponse>) {
    let mut headers = HeaderMap::new();
    cookies::set_auth_cookies(&mut headers, &session.access_token, &session.refresh_token);
    let dashboard = session.resolution.dashboard().into();
    (
        headers,
        Json(AuthResponse {
            user,
            access_token: session.access_token,
            resolution: session.resolution,
            dashboard,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /api/auth/register
// ---------------------------------------------------------------------------

/// Create an identity and sign it in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered and signed in", body = AuthResponse),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all, fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AppError> {
    body.validate_request()?;

    let hash = password::hash_for_storage(&body.password)?;
    let user = repo::identity::create(&state.pool, &body.email, &hash, &body.display_name).await?;
    let session = open_session(&state, &user).await?;

    let (headers, json) = session_response(user, session);
    Ok((StatusCode::CREATED, headers, json))
}

// ---------------------------------------------------------------------------
// POST /api/auth/login
// ---------------------------------------------------------------------------

/// Verify credentials, open a session and resolve its role.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = AppError),
        (status = 422, description = "Validation failed", body = AppError),
        (status = 429, description = "Too many attempts", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all, fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    body.validate_request()?;

    let Some(identity) = repo::identity::find_by_email(&state.pool, &body.email).await? else {
        tracing::info!("Login for unknown email");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    let verified = password::verify_password(&body.password, &identity.password_hash)
        .unwrap_or_else(|e| {
            tracing::warn!(user_id = %identity.id, error = %e, "Stored password hash is unreadable");
            false
        });
    if !verified {
        tracing::info!(user_id = %identity.id, "Login with wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let user = AuthUser::from(identity);
    let session = open_session(&state, &user).await?;
    Ok(session_response(user, session))
}

// ---------------------------------------------------------------------------
// POST /api/auth/logout
// ---------------------------------------------------------------------------

/// End the current session: revoke its refresh tokens, drop its cached
/// role and clear the auth cookies. Succeeds without a session too.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Signed out")
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    MaybeAuth(claims): MaybeAuth,
) -> Result<(StatusCode, HeaderMap), AppError> {
    if let Some(claims) = claims {
        let revoked = repo::refresh_token::revoke_session(&state.pool, &claims.sid).await?;
        state.sessions.end(&claims.sid);
        tracing::info!(sub = %claims.sub, sid = %claims.sid, revoked, "Session ended");
    }

    let mut headers = HeaderMap::new();
    cookies::clear_auth_cookies(&mut headers);
    Ok((StatusCode::NO_CONTENT, headers))
}

// ---------------------------------------------------------------------------
// GET /api/auth/me
// ---------------------------------------------------------------------------

/// The authenticated identity and its session's current role.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = SessionUser),
        (status = 401, description = "Not signed in", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all, fields(sub = %claims.sub))]
pub async fn me(
    State(state): State<AppState>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<SessionUser>, AppError> {
    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let user = repo::identity::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

    let role = session_role(&state, &claims).await.into_role();
    Ok(Json(SessionUser { user, role }))
}
