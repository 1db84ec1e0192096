use chrono::{DateTime, Utc};
use portal_types::AppError;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Persist the hash of a newly issued refresh token.
pub async fn store(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    session_id: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, session_id, token_hash, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(session_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(())
}

/// Revoke a live refresh token in a single statement. Returns false when
/// the token is unknown, already revoked, expired, or owned by someone else,
/// so a token can be rotated at most once.
pub async fn consume(
    pool: &Pool<Postgres>,
    token_hash: &str,
    user_id: Uuid,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE token_hash = $1 AND user_id = $2 AND NOT revoked AND expires_at > NOW()
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}

/// Revoke every refresh token of a login session. Returns how many were revoked.
pub async fn revoke_session(pool: &Pool<Postgres>, session_id: &str) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE session_id = $1 AND NOT revoked",
    )
    .bind(session_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected())
}
