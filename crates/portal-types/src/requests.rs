use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

/// Request DTO for creating an admin-managed user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateOwcUserRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Name is required"))
    )]
    pub name: String,
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Valid email is required"))
    )]
    pub email: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 8, message = "Password must be at least 8 characters"))
    )]
    pub password: String,
}

/// Request DTO for updating an admin-managed user. The password is only
/// replaced when one is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateOwcUserRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Name is required"))
    )]
    pub name: String,
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Valid email is required"))
    )]
    pub email: String,
    #[serde(default)]
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 8, message = "Password must be at least 8 characters"))
    )]
    pub password: Option<String>,
}

/// Assign a subject to a group, replacing any existing membership.
/// Exactly one of `owc_user_id` and `user_id` must be given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignGroupRequest {
    #[serde(default)]
    pub owc_user_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub group_id: i64,
}

/// Subject of a membership assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipSubject {
    Identity(Uuid),
    OwcUser(i64),
}

impl AssignGroupRequest {
    /// The single subject named by the request, if exactly one is present.
    pub fn subject(&self) -> Option<MembershipSubject> {
        match (self.user_id, self.owc_user_id) {
            (Some(user_id), None) => Some(MembershipSubject::Identity(user_id)),
            (None, Some(owc_user_id)) => Some(MembershipSubject::OwcUser(owc_user_id)),
            _ => None,
        }
    }
}
