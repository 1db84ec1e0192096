/// Session-scoped storage for the last resolved role and the email it was
/// resolved for.
///
/// Implementations use interior mutability; one cache is shared by every
/// request of the same session and the last write wins.
pub trait RoleCache: Send + Sync {
    /// The cached role, if any.
    fn get(&self) -> Option<String>;

    /// Replace the cached role. Empty roles are ignored.
    fn set(&self, role: &str);

    /// Remove the cached role and email.
    fn clear(&self);

    /// Email the cached role belongs to.
    fn email(&self) -> Option<String>;

    /// Record the email the cached role belongs to.
    fn set_email(&self, email: &str);
}
