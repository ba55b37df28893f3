use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decrypted credentials needed to talk to Google Ads on behalf of one user.
#[derive(Clone)]
pub struct GoogleAdsCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub developer_token: String,
    pub refresh_token: String,
    /// Digits only.
    pub customer_id: String,
    /// Manager account id, digits only, when access goes through an MCC.
    pub login_customer_id: Option<String>,
}

impl fmt::Debug for GoogleAdsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleAdsCredentials")
            .field("client_id", &self.client_id)
            .field("customer_id", &self.customer_id)
            .field("login_customer_id", &self.login_customer_id)
            .finish_non_exhaustive()
    }
}

/// Strip everything but ASCII digits (`123-456-7890` -> `1234567890`).
pub fn normalize_customer_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// A campaign as reported by the platform right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveCampaign {
    pub campaign_id: String,
    pub name: String,
    pub status: String,
    pub channel_type: Option<String>,
    pub budget_micros: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One campaign-day of metrics as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveDailyMetrics {
    pub campaign_id: String,
    pub campaign_name: String,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub conversions_value: f64,
}

/// Outcome of a successful connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    pub accessible_customer_ids: Vec<String>,
    /// Whether the configured customer is among the accessible ones (direct or via manager).
    pub customer_accessible: bool,
    pub token_expiry: Option<DateTime<Utc>>,
}
