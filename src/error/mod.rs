mod adpulse;
mod oauth;

pub use adpulse::{AdpulseError, ApiErrorBody, ApiErrorObject};
pub use oauth::OauthError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
