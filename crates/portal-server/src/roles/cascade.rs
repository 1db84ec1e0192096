use portal_types::{AppError, RoleResolution};

use super::{RoleCache, RoleDirectory, RoleOverrides};

/// Resolve the display role for an identity.
///
/// Strategies run in order and the first success wins:
/// 1. the session cache,
/// 2. the static override table (by email),
/// 3. the identity's own membership → group title,
/// 4. the admin-managed user with the same email → membership → group title,
/// 5. the default role.
///
/// Never fails: lookup errors are logged and treated as "not found".
/// The outcome is written back to `cache` unless both inputs are absent,
/// in which case no lookup is made at all.
#[tracing::instrument(skip(directory, cache, overrides))]
pub async fn resolve_role<D, C>(
    directory: &D,
    cache: &C,
    overrides: &RoleOverrides,
    user_id: Option<&str>,
    email: Option<&str>,
) -> RoleResolution
where
    D: RoleDirectory,
    C: RoleCache,
{
    let user_id = present(user_id);
    let email = present(email);

    if user_id.is_none() && email.is_none() {
        tracing::debug!("No identity supplied, using default role");
        return RoleResolution::default_role();
    }

    // A role cached for a different identity must not leak into this one.
    if let (Some(email), Some(cached_email)) = (email, cache.email()) {
        if !cached_email.eq_ignore_ascii_case(email) {
            tracing::debug!("Cached role belongs to another email, clearing");
            cache.clear();
        }
    }

    if let Some(role) = cache.get() {
        return RoleResolution::CachedHit(role);
    }

    let resolution = lookup(directory, overrides, user_id, email).await;
    cache.set(resolution.role());
    if let Some(email) = email {
        cache.set_email(email);
    }

    tracing::info!(
        source = resolution.source(),
        role = resolution.role(),
        "Role resolved"
    );
    resolution
}

async fn lookup<D: RoleDirectory>(
    directory: &D,
    overrides: &RoleOverrides,
    user_id: Option<&str>,
    email: Option<&str>,
) -> RoleResolution {
    if let Some(role) = email.and_then(|e| overrides.lookup(e)) {
        return RoleResolution::OverrideHit(role.to_string());
    }

    if let Some(user_id) = user_id {
        if let Some(role) = direct_lookup(directory, user_id).await {
            return RoleResolution::DirectLookup(role);
        }
    }

    if let Some(email) = email {
        if let Some(role) = email_fallback(directory, email).await {
            return RoleResolution::EmailFallback(role);
        }
    }

    RoleResolution::default_role()
}

async fn direct_lookup<D: RoleDirectory>(directory: &D, user_id: &str) -> Option<String> {
    let group_id = found("membership by user", directory.group_id_for_user(user_id).await)?;
    group_title(directory, group_id).await
}

async fn email_fallback<D: RoleDirectory>(directory: &D, email: &str) -> Option<String> {
    let owc_user_id = found("user by email", directory.owc_user_id_for_email(email).await)?;
    let group_id = found(
        "membership by owc user",
        directory.group_id_for_owc_user(owc_user_id).await,
    )?;
    group_title(directory, group_id).await
}

/// Title of a group, verbatim. A missing group or blank title counts as
/// no role; a membership may reference a group that no longer exists.
async fn group_title<D: RoleDirectory>(directory: &D, group_id: i64) -> Option<String> {
    let title = found("group by id", directory.group_title(group_id).await);
    if title.is_none() {
        tracing::debug!(group_id, "Membership references no usable group");
    }
    title.filter(|t| !t.trim().is_empty())
}

fn found<T>(step: &'static str, result: Result<Option<T>, AppError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(step, error = %e, "Role lookup failed, treating as not found");
            None
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
