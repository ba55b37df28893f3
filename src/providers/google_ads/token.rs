use crate::error::AdpulseError;
use crate::oauth_utils::RefreshOauth2Client;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use oauth2::{RefreshToken, TokenResponse};
use tokio::sync::Mutex;
use tracing::debug;

/// Access tokens are renewed this long before Google says they expire.
const EXPIRY_SKEW_SECS: i64 = 5 * 60;
/// Used when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Per-client access token cache over a long-lived refresh token.
pub(super) struct TokenCache {
    oauth: RefreshOauth2Client,
    refresh_token: RefreshToken,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub(super) fn new(oauth: RefreshOauth2Client, refresh_token: &str) -> Self {
        Self {
            oauth,
            refresh_token: RefreshToken::new(refresh_token.to_string()),
            cached: Mutex::new(None),
        }
    }

    /// Return a usable access token and its expiry, refreshing if needed.
    ///
    /// The lock is held across the refresh so concurrent callers share one grant.
    pub(super) async fn access_token(
        &self,
        http: &reqwest::Client,
    ) -> Result<(String, DateTime<Utc>), AdpulseError> {
        let mut guard = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = guard.as_ref()
            && token.expires_at - ChronoDuration::seconds(EXPIRY_SKEW_SECS) > now
        {
            return Ok((token.access_token.clone(), token.expires_at));
        }

        let resp = self
            .oauth
            .exchange_refresh_token(&self.refresh_token)
            .request_async(http)
            .await?;

        let ttl = resp
            .expires_in()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let token = CachedToken {
            access_token: resp.access_token().secret().clone(),
            expires_at: now + ChronoDuration::seconds(ttl),
        };
        debug!(expires_at = %token.expires_at, "Google OAuth access token refreshed");

        let out = (token.access_token.clone(), token.expires_at);
        *guard = Some(token);
        Ok(out)
    }
}
