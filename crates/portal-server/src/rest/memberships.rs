use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use portal_types::{AppError, AssignGroupRequest, Membership, MembershipDetail, MembershipSubject};
use sqlx::{Pool, Postgres};

use super::parse_id;
use crate::auth::extractors::AdminRequired;
use crate::repo;

/// List memberships with the member's email and the group title.
#[utoipa::path(
    get,
    path = "/api/admin/memberships",
    responses(
        (status = 200, description = "All memberships", body = Vec<MembershipDetail>),
        (status = 403, description = "Admin role required", body = AppError)
    ),
    tag = "admin"
)]
pub async fn list_memberships(
    _admin: AdminRequired,
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<MembershipDetail>>, AppError> {
    Ok(Json(repo::membership::list_detailed(&pool).await?))
}

/// Assign a user to a group, replacing any group it was in.
///
/// Roles already cached in open sessions are kept until the session
/// clears its cache or signs out.
#[utoipa::path(
    put,
    path = "/api/admin/memberships",
    request_body = AssignGroupRequest,
    responses(
        (status = 200, description = "Membership assigned", body = Membership),
        (status = 400, description = "Not exactly one subject given", body = AppError),
        (status = 404, description = "Unknown user or group", body = AppError)
    ),
    tag = "admin"
)]
#[tracing::instrument(skip_all, fields(admin = %admin.sub, group_id = body.group_id))]
pub async fn assign_membership(
    AdminRequired(admin): AdminRequired,
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<AssignGroupRequest>,
) -> Result<Json<Membership>, AppError> {
    let subject = body
        .subject()
        .ok_or_else(|| AppError::bad_request("Give exactly one of owc_user_id or user_id"))?;

    if repo::group::find_by_id(&pool, body.group_id).await?.is_none() {
        return Err(AppError::not_found(format!("Group {} not found", body.group_id)));
    }

    let subject_exists = match subject {
        MembershipSubject::Identity(user_id) => {
            repo::identity::find_by_id(&pool, user_id).await?.is_some()
        }
        MembershipSubject::OwcUser(owc_user_id) => {
            repo::owc_user::find_by_id(&pool, owc_user_id).await?.is_some()
        }
    };
    if !subject_exists {
        return Err(AppError::not_found("User not found"));
    }

    let membership = repo::membership::assign(&pool, subject, body.group_id).await?;
    tracing::info!(membership_id = membership.id, ?subject, "Membership assigned");
    Ok(Json(membership))
}

/// Remove a membership ("remove from group").
#[utoipa::path(
    delete,
    path = "/api/admin/memberships/{id}",
    params(("id" = i64, Path, description = "Membership id")),
    responses(
        (status = 204, description = "Membership removed"),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "admin"
)]
#[tracing::instrument(skip_all, fields(admin = %admin.sub, membership_id = %id))]
pub async fn delete_membership(
    AdminRequired(admin): AdminRequired,
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;

    if repo::membership::delete(&pool, id).await? {
        tracing::info!("Membership removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Membership {id} not found")))
    }
}
