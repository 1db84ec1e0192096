use portal_types::{AppError, Group};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<Group>, AppError> {
    sqlx::query_as::<_, Group>("SELECT id, title, description FROM groups ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<Group>, AppError> {
    sqlx::query_as::<_, Group>("SELECT id, title, description FROM groups WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Title of a group, verbatim.
pub async fn title_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<String>, AppError> {
    sqlx::query_scalar::<_, String>("SELECT title FROM groups WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}
