pub mod cache;
pub mod config;
pub mod db;
pub mod error;
mod oauth_utils;
pub mod providers;
pub mod server;
pub mod sync;
mod utils;
pub mod vault;

pub use error::AdpulseError;
pub use vault::CredentialVault;
