use portal_types::{RolesConfig, BOOTSTRAP_ADMIN_ROLE};
use std::collections::HashMap;

/// Email → role table for accounts that must resolve before any group
/// membership has been provisioned. Keys are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct RoleOverrides {
    entries: HashMap<String, String>,
}

impl RoleOverrides {
    /// Build the table from the `[roles]` config section plus an optional
    /// extra administrator address (the `ADMIN_EMAIL` variable).
    /// Blank emails or roles are skipped. Later entries win.
    pub fn from_config(config: &RolesConfig, admin_email: Option<&str>) -> Self {
        let mut overrides = Self::default();
        for entry in &config.overrides {
            overrides.insert(&entry.email, &entry.role);
        }
        if let Some(email) = admin_email {
            overrides.insert(email, BOOTSTRAP_ADMIN_ROLE);
        }
        overrides
    }

    /// Build from the loaded config and the `ADMIN_EMAIL` environment variable.
    pub fn from_env() -> Self {
        let admin_email = std::env::var("ADMIN_EMAIL").ok();
        Self::from_config(&crate::config::roles_config(), admin_email.as_deref())
    }

    fn insert(&mut self, email: &str, role: &str) {
        let email = email.trim();
        let role = role.trim();
        if email.is_empty() || role.is_empty() {
            return;
        }
        self.entries.insert(email.to_lowercase(), role.to_string());
    }

    /// Case-insensitive lookup on the trimmed email.
    pub fn lookup(&self, email: &str) -> Option<&str> {
        self.entries
            .get(&email.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: AsRef<str>, R: AsRef<str>> FromIterator<(E, R)> for RoleOverrides {
    fn from_iter<I: IntoIterator<Item = (E, R)>>(iter: I) -> Self {
        let mut overrides = Self::default();
        for (email, role) in iter {
            overrides.insert(email.as_ref(), role.as_ref());
        }
        overrides
    }
}
