use portal_types::{AppError, Membership, MembershipDetail, MembershipSubject};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Group id of an identity's own membership.
pub async fn group_id_for_user(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<i64>, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT group_id FROM user_groups WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Group id of an admin-managed user's membership.
pub async fn group_id_for_owc_user(
    pool: &Pool<Postgres>,
    owc_user_id: i64,
) -> Result<Option<i64>, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT group_id FROM user_groups WHERE owc_user_id = $1")
        .bind(owc_user_id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// All memberships joined with the subject's email and the group title.
pub async fn list_detailed(pool: &Pool<Postgres>) -> Result<Vec<MembershipDetail>, AppError> {
    sqlx::query_as::<_, MembershipDetail>(
        r#"
        SELECT ug.id,
               ug.user_id,
               ug.owc_user_id,
               COALESCE(u.email, o.email) AS user_email,
               ug.group_id,
               g.title AS group_title,
               ug.assigned_at
        FROM user_groups ug
        LEFT JOIN users u ON u.id = ug.user_id
        LEFT JOIN owc_users o ON o.id = ug.owc_user_id
        LEFT JOIN groups g ON g.id = ug.group_id
        ORDER BY ug.id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

const ASSIGN_IDENTITY: &str = r#"
    INSERT INTO user_groups (user_id, group_id)
    VALUES ($1, $2)
    ON CONFLICT (user_id) WHERE user_id IS NOT NULL
    DO UPDATE SET group_id = EXCLUDED.group_id, assigned_at = NOW()
    RETURNING id, user_id, owc_user_id, group_id, assigned_at
"#;

const ASSIGN_OWC_USER: &str = r#"
    INSERT INTO user_groups (owc_user_id, group_id)
    VALUES ($1, $2)
    ON CONFLICT (owc_user_id) WHERE owc_user_id IS NOT NULL
    DO UPDATE SET group_id = EXCLUDED.group_id, assigned_at = NOW()
    RETURNING id, user_id, owc_user_id, group_id, assigned_at
"#;

/// Put a subject in a group, replacing its current membership if any.
pub async fn assign(
    pool: &Pool<Postgres>,
    subject: MembershipSubject,
    group_id: i64,
) -> Result<Membership, AppError> {
    let query = match subject {
        MembershipSubject::Identity(user_id) => {
            sqlx::query_as::<_, Membership>(ASSIGN_IDENTITY).bind(user_id)
        }
        MembershipSubject::OwcUser(owc_user_id) => {
            sqlx::query_as::<_, Membership>(ASSIGN_OWC_USER).bind(owc_user_id)
        }
    };

    query
        .bind(group_id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Remove a membership. Returns true if a row was deleted.
pub async fn delete(pool: &Pool<Postgres>, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM user_groups WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
