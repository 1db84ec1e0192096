use portal_types::{AppError, OwcUser};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

const COLUMNS: &str = "id, name, email, created_at, updated_at";

pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<OwcUser>, AppError> {
    sqlx::query_as::<_, OwcUser>(&format!("SELECT {COLUMNS} FROM owc_users ORDER BY id"))
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<OwcUser>, AppError> {
    sqlx::query_as::<_, OwcUser>(&format!("SELECT {COLUMNS} FROM owc_users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Id of the admin-managed user with this email (case-insensitive).
pub async fn id_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<i64>, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM owc_users WHERE lower(email) = lower($1)")
        .bind(email.trim())
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create(
    pool: &Pool<Postgres>,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<OwcUser, AppError> {
    sqlx::query_as::<_, OwcUser>(&format!(
        r#"
        INSERT INTO owc_users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(name.trim())
    .bind(email.trim())
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Update name and email; the password hash is replaced only when given.
/// Returns None when no such user exists.
pub async fn update(
    pool: &Pool<Postgres>,
    id: i64,
    name: &str,
    email: &str,
    password_hash: Option<&str>,
) -> Result<Option<OwcUser>, AppError> {
    sqlx::query_as::<_, OwcUser>(&format!(
        r#"
        UPDATE owc_users
        SET name = $2,
            email = $3,
            password_hash = COALESCE($4, password_hash),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name.trim())
    .bind(email.trim())
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Delete a user (and, by cascade, its membership). Returns true if a row was deleted.
pub async fn delete(pool: &Pool<Postgres>, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM owc_users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
