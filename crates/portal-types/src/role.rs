use serde::{Deserialize, Serialize};

use crate::dashboard::{resolve_dashboard, DashboardInfo, DashboardRoute};

/// Role assigned when no lookup produces one.
pub const DEFAULT_ROLE: &str = "User";

/// Outcome of role resolution, tagged with the strategy that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "source", content = "role")]
pub enum RoleResolution {
    /// Served from the session cache without touching the data store.
    CachedHit(String),
    /// Matched the configured email → role override table.
    OverrideHit(String),
    /// Found through the identity's own membership record.
    DirectLookup(String),
    /// Found through the admin-managed user record matching the email.
    EmailFallback(String),
    /// No strategy produced a role.
    Default(String),
}

impl RoleResolution {
    pub fn default_role() -> Self {
        RoleResolution::Default(DEFAULT_ROLE.to_string())
    }

    pub fn role(&self) -> &str {
        match self {
            RoleResolution::CachedHit(role)
            | RoleResolution::OverrideHit(role)
            | RoleResolution::DirectLookup(role)
            | RoleResolution::EmailFallback(role)
            | RoleResolution::Default(role) => role,
        }
    }

    pub fn into_role(self) -> String {
        match self {
            RoleResolution::CachedHit(role)
            | RoleResolution::OverrideHit(role)
            | RoleResolution::DirectLookup(role)
            | RoleResolution::EmailFallback(role)
            | RoleResolution::Default(role) => role,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            RoleResolution::CachedHit(_) => "CachedHit",
            RoleResolution::OverrideHit(_) => "OverrideHit",
            RoleResolution::DirectLookup(_) => "DirectLookup",
            RoleResolution::EmailFallback(_) => "EmailFallback",
            RoleResolution::Default(_) => "Default",
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, RoleResolution::Default(_))
    }

    pub fn dashboard(&self) -> DashboardRoute {
        resolve_dashboard(Some(self.role()))
    }
}

/// Role of the current session together with where it routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleResponse {
    pub resolution: RoleResolution,
    pub dashboard: DashboardInfo,
}

impl From<RoleResolution> for RoleResponse {
    fn from(resolution: RoleResolution) -> Self {
        let dashboard = resolution.dashboard().into();
        Self {
            resolution,
            dashboard,
        }
    }
}
