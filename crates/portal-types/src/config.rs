use serde::{Deserialize, Serialize};

/// Email of the bootstrap administrator account recognized before any
/// group-based provisioning exists.
pub const BOOTSTRAP_ADMIN_EMAIL: &str = "administrator@gmail.com";

/// Role title granted to bootstrap administrator accounts.
pub const BOOTSTRAP_ADMIN_ROLE: &str = "OWC Admin";

/// Feature flags controlling which optional integrations are active.
///
/// Every field defaults to `false` so that a missing or incomplete
/// config file disables all optional features.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeatureFlags {
    /// Export traces and logs over OTLP.
    #[serde(default)]
    pub telemetry: bool,
    /// Sliding-window rate limiting on the login endpoint.
    #[serde(default)]
    pub rate_limit: bool,
}

/// One email → role override from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleOverrideEntry {
    pub email: String,
    pub role: String,
}

/// The `[roles]` section of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RolesConfig {
    #[serde(default = "bootstrap_overrides")]
    pub overrides: Vec<RoleOverrideEntry>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            overrides: bootstrap_overrides(),
        }
    }
}

fn bootstrap_overrides() -> Vec<RoleOverrideEntry> {
    vec![RoleOverrideEntry {
        email: BOOTSTRAP_ADMIN_EMAIL.to_string(),
        role: BOOTSTRAP_ADMIN_ROLE.to_string(),
    }]
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub roles: RolesConfig,
}
