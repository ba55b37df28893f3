use serde::{Deserialize, Serialize};
use url::Url;

use super::ProviderDefaults;

/// Google Ads provider configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleAdsConfig {
    /// Optional upstream HTTP proxy. If set, used for reqwest clients.
    /// TOML: `providers.google_ads.proxy`. Example: `http://127.0.0.1:1080`.
    /// Falls back to `providers.defaults.proxy` when unset.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Google Ads REST API base URL.
    /// TOML: `providers.google_ads.api_base_url`. Default: `https://googleads.googleapis.com`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Url,

    /// Google Ads API version path segment.
    /// TOML: `providers.google_ads.api_version`. Default: `v18`.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// OAuth2 token endpoint used for the refresh-token grant.
    /// TOML: `providers.google_ads.token_url`. Default: `https://oauth2.googleapis.com/token`.
    #[serde(default = "default_token_url")]
    pub token_url: Url,

    /// Upstream API calls per second shared by every Google Ads client.
    /// TOML: `providers.google_ads.api_tps`. Default: `5`.
    #[serde(default = "default_api_tps")]
    pub api_tps: usize,

    /// Total per-request timeout for upstream calls, in seconds.
    /// TOML: `providers.google_ads.request_timeout_secs`. Default: `30`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Allow HTTP/2 multiplexing for reqwest clients; disabled forces HTTP/1.
    /// TOML: `providers.google_ads.enable_multiplexing`.
    /// Falls back to `providers.defaults.enable_multiplexing`.
    #[serde(default)]
    pub enable_multiplexing: Option<bool>,

    /// Max retry attempts for Google Ads upstream calls.
    /// TOML: `providers.google_ads.retry_max_times`.
    /// Falls back to `providers.defaults.retry_max_times`.
    #[serde(default)]
    pub retry_max_times: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct GoogleAdsResolvedConfig {
    pub proxy: Option<Url>,
    pub api_base_url: Url,
    pub api_version: String,
    pub token_url: Url,
    pub api_tps: usize,
    pub request_timeout_secs: u64,
    pub enable_multiplexing: bool,
    pub retry_max_times: usize,
}

impl GoogleAdsConfig {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> GoogleAdsResolvedConfig {
        GoogleAdsResolvedConfig {
            proxy: self.proxy.clone().or_else(|| defaults.proxy.clone()),
            api_base_url: self.api_base_url.clone(),
            api_version: self.api_version.clone(),
            token_url: self.token_url.clone(),
            api_tps: self.api_tps,
            request_timeout_secs: self.request_timeout_secs,
            enable_multiplexing: self
                .enable_multiplexing
                .unwrap_or(defaults.enable_multiplexing),
            retry_max_times: self.retry_max_times.unwrap_or(defaults.retry_max_times),
        }
    }
}

impl Default for GoogleAdsConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            token_url: default_token_url(),
            api_tps: default_api_tps(),
            request_timeout_secs: default_request_timeout_secs(),
            enable_multiplexing: None,
            retry_max_times: None,
        }
    }
}

fn default_api_base_url() -> Url {
    Url::parse("https://googleads.googleapis.com").expect("valid Google Ads API base URL")
}

fn default_api_version() -> String {
    "v18".to_string()
}

fn default_token_url() -> Url {
    Url::parse("https://oauth2.googleapis.com/token").expect("valid Google OAuth token URL")
}

fn default_api_tps() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}
