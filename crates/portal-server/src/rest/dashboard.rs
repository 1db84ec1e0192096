use axum::{extract::Query, Json};
use portal_types::{known_dashboard_paths, resolve_dashboard, AppError, DashboardInfo};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct RouteParams {
    /// Role title; omitted or blank routes to the default dashboard.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct ViewParams {
    /// Routing-surface path, e.g. `/registrar-dashboard`.
    pub path: String,
}

/// Map a role title to its dashboard path and view.
#[utoipa::path(
    get,
    path = "/api/dashboard/route",
    params(RouteParams),
    responses(
        (status = 200, description = "Dashboard for the role", body = DashboardInfo)
    ),
    tag = "dashboard"
)]
pub async fn route_for_role(Query(params): Query<RouteParams>) -> Json<DashboardInfo> {
    Json(resolve_dashboard(params.role.as_deref()).into())
}

/// Map a routing-surface path to the view that renders it.
#[utoipa::path(
    get,
    path = "/api/dashboard/view",
    params(ViewParams),
    responses(
        (status = 200, description = "View for the path", body = DashboardInfo),
        (status = 400, description = "Path is not absolute", body = AppError)
    ),
    tag = "dashboard"
)]
pub async fn view_for_path(Query(params): Query<ViewParams>) -> Result<Json<DashboardInfo>, AppError> {
    let path = params.path.trim();
    if !path.starts_with('/') {
        return Err(AppError::bad_request("Path must start with '/'"));
    }

    Ok(Json(DashboardInfo {
        path: path.to_string(),
        view: portal_types::view_for_path(path),
    }))
}

/// Every dashboard path a role can resolve to.
#[utoipa::path(
    get,
    path = "/api/dashboard/paths",
    responses(
        (status = 200, description = "Known dashboard paths", body = Vec<DashboardInfo>)
    ),
    tag = "dashboard"
)]
pub async fn list_paths() -> Json<Vec<DashboardInfo>> {
    Json(
        known_dashboard_paths()
            .into_iter()
            .map(|path| DashboardInfo {
                path: path.to_string(),
                view: portal_types::view_for_path(path),
            })
            .collect(),
    )
}
