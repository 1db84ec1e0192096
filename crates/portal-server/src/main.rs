use std::net::SocketAddr;
use std::time::Duration;

use portal_server::{auth, config, db, health, openapi, roles::RoleOverrides, telemetry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    config::load_config();
    let flags = config::feature_flags();
    if flags.telemetry {
        if let Err(e) = telemetry::init_telemetry() {
            tracing::warn!(error = %e, "Telemetry disabled");
        }
    }
    health::record_start_time();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let pool = db::create_pool(&database_url)?;
    db::run_migrations(&pool).await?;

    let overrides = RoleOverrides::from_env();
    tracing::info!(overrides = overrides.len(), "Role overrides loaded");
    let state = db::AppState::new(pool, overrides);

    // Background task: drop sessions idle longer than a refresh token lives.
    let sessions = state.sessions.clone();
    let max_idle = Duration::from_secs(auth::jwt::refresh_token_expiry_days().max(1) as u64 * 24 * 60 * 60);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_idle(max_idle);
            if purged > 0 {
                tracing::debug!(purged, "Idle sessions purged");
            }
        }
    });

    let router = openapi::app_router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "OWC claims portal listening");
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
