use chrono::{DateTime, Utc};
use portal_types::{AppError, AuthUser};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Identity row including the password hash. Never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdentityRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<IdentityRow> for AuthUser {
    fn from(row: IdentityRow) -> Self {
        AuthUser {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

/// Insert a new identity.
pub async fn create(
    pool: &Pool<Postgres>,
    email: &str,
    password_hash: &str,
    display_name: &str,
) -> Result<AuthUser, AppError> {
    sqlx::query_as::<_, AuthUser>(
        r#"
        INSERT INTO users (id, email, password_hash, display_name)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, display_name, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.trim())
    .bind(password_hash)
    .bind(display_name.trim())
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Find an identity by email (case-insensitive), including its hash.
pub async fn find_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<IdentityRow>, AppError> {
    sqlx::query_as::<_, IdentityRow>(
        r#"
        SELECT id, email, password_hash, display_name, created_at
        FROM users
        WHERE lower(email) = lower($1)
        "#,
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<AuthUser>, AppError> {
    sqlx::query_as::<_, AuthUser>(
        "SELECT id, email, display_name, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
