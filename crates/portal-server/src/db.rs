use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::auth::session::SessionStore;
use crate::roles::{PgRoleDirectory, RoleOverrides};

/// Shared application state passed to Axum handlers via `State`.
/// Derives `FromRef` so handlers can extract any single field directly.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub sessions: SessionStore,
    pub overrides: Arc<RoleOverrides>,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, overrides: RoleOverrides) -> Self {
        Self {
            pool,
            sessions: SessionStore::new(),
            overrides: Arc::new(overrides),
        }
    }

    /// Role directory over this state's pool.
    pub fn directory(&self) -> PgRoleDirectory {
        PgRoleDirectory::new(self.pool.clone())
    }
}

/// Create a connection pool. Uses `connect_lazy` so no connections open
/// until the first query.
pub fn create_pool(database_url: &str) -> Result<Pool<Postgres>, sqlx::Error> {
    let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy(database_url)
}

/// Run database migrations against the given pool.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
