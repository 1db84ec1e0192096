//! Role resolution: the ordered lookup cascade, its data-store seam,
//! the session cache seam and the static override table.

pub mod cache;
pub mod cascade;
pub mod directory;
pub mod overrides;

pub use cache::RoleCache;
pub use cascade::resolve_role;
pub use directory::{PgRoleDirectory, RoleDirectory};
pub use overrides::RoleOverrides;
