use axum::{
    extract::{Path, State},
    Json,
};
use portal_types::{AppError, Group};
use sqlx::{Pool, Postgres};

use super::parse_id;
use crate::auth::extractors::AdminRequired;
use crate::repo;

/// List groups. Groups are seed data and read-only here.
#[utoipa::path(
    get,
    path = "/api/admin/groups",
    responses(
        (status = 200, description = "All groups", body = Vec<Group>),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "admin"
)]
pub async fn list_groups(
    _admin: AdminRequired,
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<Group>>, AppError> {
    Ok(Json(repo::group::list(&pool).await?))
}

/// Get a group by id.
#[utoipa::path(
    get,
    path = "/api/admin/groups/{id}",
    params(("id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group found", body = Group),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "admin"
)]
pub async fn get_group(
    _admin: AdminRequired,
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Group>, AppError> {
    let id = parse_id(&id)?;

    repo::group::find_by_id(&pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Group {id} not found")))
}
