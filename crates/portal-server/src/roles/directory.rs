use portal_types::AppError;
use sqlx::{Pool, Postgres};
use std::future::Future;
use uuid::Uuid;

use crate::repo;

/// Point lookups the role cascade issues against the data store.
///
/// Each lookup answers `Ok(None)` when nothing matches. Errors are reported
/// to the caller, which decides how to degrade.
pub trait RoleDirectory: Send + Sync {
    /// Membership by user identifier → group id.
    fn group_id_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<i64>, AppError>> + Send;

    /// Group by id → title.
    fn group_title(
        &self,
        group_id: i64,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// Admin-managed user by email → owc user id.
    fn owc_user_id_for_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<i64>, AppError>> + Send;

    /// Membership by admin-managed user → group id.
    fn group_id_for_owc_user(
        &self,
        owc_user_id: i64,
    ) -> impl Future<Output = Result<Option<i64>, AppError>> + Send;
}

/// [`RoleDirectory`] backed by the Postgres tables.
#[derive(Clone)]
pub struct PgRoleDirectory {
    pool: Pool<Postgres>,
}

impl PgRoleDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

impl RoleDirectory for PgRoleDirectory {
    async fn group_id_for_user(&self, user_id: &str) -> Result<Option<i64>, AppError> {
        // Identifiers are UUIDs here; anything else cannot have a membership.
        let Ok(user_id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };
        repo::membership::group_id_for_user(&self.pool, user_id).await
    }

    async fn group_title(&self, group_id: i64) -> Result<Option<String>, AppError> {
        repo::group::title_by_id(&self.pool, group_id).await
    }

    async fn owc_user_id_for_email(&self, email: &str) -> Result<Option<i64>, AppError> {
        repo::owc_user::id_by_email(&self.pool, email).await
    }

    async fn group_id_for_owc_user(&self, owc_user_id: i64) -> Result<Option<i64>, AppError> {
        repo::membership::group_id_for_owc_user(&self.pool, owc_user_id).await
    }
}
