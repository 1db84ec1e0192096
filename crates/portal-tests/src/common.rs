use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use portal_server::{db::AppState, rate_limit::RateLimitState, roles::RoleOverrides};
use portal_types::RolesConfig;
use serde_json::Value;
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Global mutex ensuring tests run sequentially against the shared database.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

pub const ADMIN_EMAIL: &str = "administrator@gmail.com";
pub const PASSWORD: &str = "correct-horse-battery";

/// A router over a freshly truncated database, plus the lock that keeps
/// other tests off the database while this one runs.
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Postgres>,
    pub state: AppState,
    _guard: tokio::sync::MutexGuard<'static, ()>,
}

async fn prepare_pool() -> Option<(Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>)> {
    let guard = TEST_MUTEX.lock().await;
    let _ = dotenvy::dotenv();

    let Ok(database_url) = std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) else {
        eprintln!("TEST_DATABASE_URL or DATABASE_URL not set, skipping database test");
        return None;
    };
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "portal-test-secret");
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    portal_server::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    // groups keep their seeded rows; everything else starts empty.
    sqlx::query("TRUNCATE user_groups, refresh_tokens, owc_users, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to truncate");

    Some((pool, guard))
}

fn test_state(pool: &Pool<Postgres>) -> AppState {
    AppState::new(pool.clone(), RoleOverrides::from_config(&RolesConfig::default(), None))
}

/// Full application router, layers included. `None` when no database is configured.
pub async fn test_app() -> Option<TestApp> {
    let (pool, guard) = prepare_pool().await?;
    let state = test_state(&pool);
    let router = portal_server::openapi::app_router(state.clone());
    Some(TestApp {
        router,
        pool,
        state,
        _guard: guard,
    })
}

/// Router whose login endpoint allows only `max_requests` attempts per minute.
pub async fn test_app_rate_limited(max_requests: usize) -> Option<TestApp> {
    let (pool, guard) = prepare_pool().await?;
    let state = test_state(&pool);
    let limit = RateLimitState::new(max_requests, std::time::Duration::from_secs(60));
    let router = portal_server::rest::api_router_with(Some(limit))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            portal_server::auth::middleware::auth_middleware,
        ))
        .with_state(state.clone());
    Some(TestApp {
        router,
        pool,
        state,
        _guard: guard,
    })
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request through the router and return status, headers and JSON body.
pub async fn send_full(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.expect("Failed to send request");

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes)
            .unwrap_or(Value::String(String::from_utf8_lossy(&body_bytes).to_string()))
    };

    (status, headers, body)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send_full(app, req).await;
    (status, body)
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request("GET", uri, token, None)).await
}

pub async fn post_json(app: &Router, uri: &str, body: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request("POST", uri, token, Some(body))).await
}

pub async fn put_json(app: &Router, uri: &str, body: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request("PUT", uri, token, Some(body))).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request("DELETE", uri, token, None)).await
}

/// Register an identity and return the response body (user, token, resolution).
pub async fn register(app: &Router, email: &str) -> Value {
    let body = serde_json::json!({
        "email": email,
        "password": PASSWORD,
        "display_name": "Test Person",
    });
    let (status, response) = post_json(app, "/api/auth/register", &body.to_string(), None).await;
    assert_eq!(status, StatusCode::CREATED, "Register failed: {response:?}");
    response
}

/// Log in and return the response body.
pub async fn login(app: &Router, email: &str) -> Value {
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    let (status, response) = post_json(app, "/api/auth/login", &body.to_string(), None).await;
    assert_eq!(status, StatusCode::OK, "Login failed: {response:?}");
    response
}

/// Access token from an auth response.
pub fn token_of(response: &Value) -> String {
    response["access_token"]
        .as_str()
        .expect("access_token in auth response")
        .to_string()
}

/// Register the bootstrap administrator and return its access token.
pub async fn admin_token(app: &Router) -> String {
    token_of(&register(app, ADMIN_EMAIL).await)
}

/// Create an admin-managed user and return its id.
pub async fn create_owc_user(app: &Router, admin: &str, name: &str, email: &str) -> i64 {
    let body = serde_json::json!({ "name": name, "email": email, "password": PASSWORD });
    let (status, response) = post_json(app, "/api/admin/users", &body.to_string(), Some(admin)).await;
    assert_eq!(status, StatusCode::CREATED, "Create user failed: {response:?}");
    response["id"].as_i64().expect("user id")
}

/// Identity id (UUID string) from an auth response.
pub fn user_id_of(response: &Value) -> String {
    response["user"]["id"].as_str().expect("user.id").to_string()
}

/// Collect every `Set-Cookie` value into one `Cookie` request header.
pub fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}
