use axum::{extract::State, http::StatusCode, Json};
use portal_types::{AppError, RoleResponse};

use crate::auth::{extractors::AuthRequired, session_role};
use crate::db::AppState;
use crate::roles::RoleCache;

/// Resolve the caller's role for the current session.
///
/// Served from the session cache after the first resolution; the response
/// says which strategy produced the role.
#[utoipa::path(
    get,
    path = "/api/role",
    responses(
        (status = 200, description = "Resolved role and dashboard", body = RoleResponse),
        (status = 401, description = "Not signed in", body = AppError)
    ),
    tag = "roles"
)]
#[tracing::instrument(skip_all, fields(sub = %claims.sub, sid = %claims.sid))]
pub async fn get_role(
    State(state): State<AppState>,
    AuthRequired(claims): AuthRequired,
) -> Json<RoleResponse> {
    Json(RoleResponse::from(session_role(&state, &claims).await))
}

/// Clear the session's cached role so the next lookup hits the data store.
#[utoipa::path(
    delete,
    path = "/api/role/cache",
    responses(
        (status = 204, description = "Cache cleared"),
        (status = 401, description = "Not signed in", body = AppError)
    ),
    tag = "roles"
)]
#[tracing::instrument(skip_all, fields(sid = %claims.sid))]
pub async fn clear_role_cache(
    State(state): State<AppState>,
    AuthRequired(claims): AuthRequired,
) -> StatusCode {
    state.sessions.cache(&claims.sid).clear();
    StatusCode::NO_CONTENT
}
