use axum::Router;
use portal_types::{
    AppError, AppErrorKind, AssignGroupRequest, AuthResponse, AuthUser, CreateOwcUserRequest,
    DashboardInfo, DashboardView, Group, LoginRequest, Membership, MembershipDetail, OwcUser,
    RegisterRequest, RoleResolution, RoleResponse, SessionUser, UpdateOwcUserRequest,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::health;
use crate::rest;

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        rest::auth::register,
        rest::auth::login,
        rest::auth::logout,
        rest::auth::me,
        rest::role::get_role,
        rest::role::clear_role_cache,
        rest::dashboard::route_for_role,
        rest::dashboard::view_for_path,
        rest::dashboard::list_paths,
        rest::admin_users::list_users,
        rest::admin_users::create_user,
        rest::admin_users::get_user,
        rest::admin_users::update_user,
        rest::admin_users::delete_user,
        rest::groups::list_groups,
        rest::groups::get_group,
        rest::memberships::list_memberships,
        rest::memberships::assign_membership,
        rest::memberships::delete_membership,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind,
        AuthUser, LoginRequest, RegisterRequest, AuthResponse, SessionUser,
        RoleResolution, RoleResponse,
        DashboardInfo, DashboardView,
        OwcUser, CreateOwcUserRequest, UpdateOwcUserRequest,
        Group, Membership, MembershipDetail, AssignGroupRequest,
        health::HealthResponse,
    )),
    tags(
        (name = "auth", description = "Sign-in, registration and session endpoints"),
        (name = "roles", description = "Role resolution for the current session"),
        (name = "dashboard", description = "Role to dashboard routing"),
        (name = "admin", description = "Portal user, group and membership administration"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "OWC Claims Portal API",
        description = "Workers' compensation claims portal: identity, roles and dashboard routing",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build an Axum router that serves the API docs at `/docs`
/// and the REST API at `/api/*`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(rest::api_router())
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}

/// Full application: API routes wrapped in the tracing, body limit, auth
/// and request-id layers. Layers run outermost-last, so request ids are
/// assigned before auth and auth claims are visible to the trace layer.
pub fn app_router(state: AppState) -> Router {
    let flags = crate::config::feature_flags();
    let mut router = api_router(state.clone());

    if flags.telemetry {
        router = router.layer(crate::telemetry::OtelTraceLayer);
    }

    let max_body: usize = std::env::var("MAX_BODY_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_BODY_BYTES);

    router
        .layer(axum::extract::DefaultBodyLimit::max(max_body))
        .layer(axum::middleware::from_fn_with_state(
            state,
            crate::auth::middleware::auth_middleware,
        ))
        .layer(tower_http::request_id::PropagateRequestIdLayer::x_request_id())
        .layer(tower_http::request_id::SetRequestIdLayer::x_request_id(
            tower_http::request_id::MakeRequestUuid,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/me",
            "/api/role",
            "/api/role/cache",
            "/api/dashboard/route",
            "/api/dashboard/view",
            "/api/dashboard/paths",
            "/api/admin/users",
            "/api/admin/users/{id}",
            "/api/admin/groups",
            "/api/admin/groups/{id}",
            "/api/admin/memberships",
            "/api/admin/memberships/{id}",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn schemas_include_resolution_and_dashboard() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("RoleResolution"));
        assert!(schemas.contains_key("DashboardInfo"));
        assert!(schemas.contains_key("MembershipDetail"));
    }
}
