pub mod auth;
pub mod identity;

pub use auth::RequireKeyAuth;
pub use identity::UserIdentity;
