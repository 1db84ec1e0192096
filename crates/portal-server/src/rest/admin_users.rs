use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use portal_types::{AppError, CreateOwcUserRequest, OwcUser, UpdateOwcUserRequest};
use sqlx::{Pool, Postgres};

use super::parse_id;
use crate::auth::extractors::AdminRequired;
use crate::auth::password;
use crate::error_convert::ValidateRequest;
use crate::repo;

// ---------------------------------------------------------------------------
// GET /api/admin/users
// ---------------------------------------------------------------------------

/// List admin-managed users.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users", body = Vec<OwcUser>),
        (status = 401, description = "Not signed in", body = AppError),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "admin"
)]
pub async fn list_users(
    _admin: AdminRequired,
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<OwcUser>>, AppError> {
    Ok(Json(repo::owc_user::list(&pool).await?))
}

// ---------------------------------------------------------------------------
// POST /api/admin/users
// ---------------------------------------------------------------------------

/// Create a user. The password is stored as a salted argon2 hash.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateOwcUserRequest,
    responses(
        (status = 201, description = "User created", body = OwcUser),
        (status = 409, description = "Email already in use", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "admin"
)]
#[tracing::instrument(skip_all, fields(admin = %admin.sub, email = %body.email))]
pub async fn create_user(
    AdminRequired(admin): AdminRequired,
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<CreateOwcUserRequest>,
) -> Result<(StatusCode, Json<OwcUser>), AppError> {
    body.validate_request()?;

    let hash = password::hash_for_storage(&body.password)?;
    let user = repo::owc_user::create(&pool, &body.name, &body.email, &hash).await?;

    tracing::info!(owc_user_id = user.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

// ---------------------------------------------------------------------------
// GET /api/admin/users/{id}
// ---------------------------------------------------------------------------

/// Get a user by id.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = OwcUser),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "admin"
)]
pub async fn get_user(
    _admin: AdminRequired,
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<OwcUser>, AppError> {
    let id = parse_id(&id)?;

    repo::owc_user::find_by_id(&pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

// ---------------------------------------------------------------------------
// PUT /api/admin/users/{id}
// ---------------------------------------------------------------------------

/// Update a user's name and email, and the password when one is supplied.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateOwcUserRequest,
    responses(
        (status = 200, description = "User updated", body = OwcUser),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Email already in use", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "admin"
)]
#[tracing::instrument(skip_all, fields(admin = %admin.sub, owc_user_id = %id))]
pub async fn update_user(
    AdminRequired(admin): AdminRequired,
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateOwcUserRequest>,
) -> Result<Json<OwcUser>, AppError> {
    let id = parse_id(&id)?;
    body.validate_request()?;

    let hash = body
        .password
        .as_deref()
        .map(password::hash_for_storage)
        .transpose()?;

    let user = repo::owc_user::update(&pool, id, &body.name, &body.email, hash.as_deref())
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;

    tracing::info!(password_changed = hash.is_some(), "User updated");
    Ok(Json(user))
}

// ---------------------------------------------------------------------------
// DELETE /api/admin/users/{id}
// ---------------------------------------------------------------------------

/// Delete a user together with its group membership.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "admin"
)]
#[tracing::instrument(skip_all, fields(admin = %admin.sub, owc_user_id = %id))]
pub async fn delete_user(
    AdminRequired(admin): AdminRequired,
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;

    if repo::owc_user::delete(&pool, id).await? {
        tracing::info!("User deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("User {id} not found")))
    }
}
