pub mod admin_users;
pub mod auth;
pub mod dashboard;
pub mod groups;
pub mod memberships;
pub mod role;

use axum::{
    routing::{get, post},
    Router,
};
use portal_types::AppError;

use crate::db::AppState;
use crate::rate_limit::{rate_limit_middleware, RateLimitState};

/// Parse a numeric path id, reporting a bad request instead of a plain-text rejection.
pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::bad_request(format!("Invalid id: {raw}")))
}

/// Build the REST API router. Login attempts are rate limited when the
/// `rate_limit` feature flag is on.
pub fn api_router() -> Router<AppState> {
    let login_limit = crate::config::feature_flags()
        .rate_limit
        .then(RateLimitState::for_login);
    api_router_with(login_limit)
}

/// Build the REST API router with an explicit login rate limiter.
pub fn api_router_with(login_limit: Option<RateLimitState>) -> Router<AppState> {
    let mut login = Router::new().route("/api/auth/login", post(auth::login));
    if let Some(limit) = login_limit {
        login = login.layer(axum::middleware::from_fn_with_state(
            limit,
            rate_limit_middleware,
        ));
    }

    Router::new()
        // Authentication
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .merge(login)
        // Role resolution
        .route("/api/role", get(role::get_role))
        .route("/api/role/cache", axum::routing::delete(role::clear_role_cache))
        // Dashboard routing
        .route("/api/dashboard/route", get(dashboard::route_for_role))
        .route("/api/dashboard/view", get(dashboard::view_for_path))
        .route("/api/dashboard/paths", get(dashboard::list_paths))
        // Admin: users
        .route(
            "/api/admin/users",
            get(admin_users::list_users).post(admin_users::create_user),
        )
        .route(
            "/api/admin/users/{id}",
            get(admin_users::get_user)
                .put(admin_users::update_user)
                .delete(admin_users::delete_user),
        )
        // Admin: groups
        .route("/api/admin/groups", get(groups::list_groups))
        .route("/api/admin/groups/{id}", get(groups::get_group))
        // Admin: memberships
        .route(
            "/api/admin/memberships",
            get(memberships::list_memberships).put(memberships::assign_membership),
        )
        .route(
            "/api/admin/memberships/{id}",
            axum::routing::delete(memberships::delete_membership),
        )
}
