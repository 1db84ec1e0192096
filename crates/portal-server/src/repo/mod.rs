pub mod group;
pub mod identity;
pub mod membership;
pub mod owc_user;
pub mod refresh_token;
