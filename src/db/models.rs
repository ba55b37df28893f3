use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;

/// External platform a configuration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiProvider {
    GoogleAds,
}

impl ApiProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiProvider::GoogleAds => "GOOGLE_ADS",
        }
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigStatus {
    Inactive,
    Active,
    Error,
}

impl ConfigStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigStatus::Inactive => "INACTIVE",
            ConfigStatus::Active => "ACTIVE",
            ConfigStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    ConfigurationSaved,
    ConfigurationDeleted,
    ConnectionTest,
    CampaignSync,
    MetricsSync,
    HistoricalSync,
    LiveFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    Success,
    Error,
    Warning,
}

/// Stored provider configuration. Secret columns hold vault ciphertext, never plaintext.
#[derive(Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DbApiConfiguration {
    pub id: i64,
    pub user_id: String,
    pub user_email: Option<String>,
    pub provider: ApiProvider,
    pub client_id: String,
    pub client_secret: String,
    pub developer_token: String,
    pub refresh_token: String,
    pub customer_id: String,
    pub login_customer_id: Option<String>,
    pub status: ConfigStatus,
    pub token_expiry: Option<DateTime<Utc>>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for DbApiConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbApiConfiguration")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("customer_id", &self.customer_id)
            .field("login_customer_id", &self.login_customer_id)
            .field("status", &self.status)
            .field("token_expiry", &self.token_expiry)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DbCampaign {
    pub id: i64,
    pub api_config_id: i64,
    /// Upstream campaign id.
    pub campaign_id: String,
    pub name: String,
    pub status: String,
    pub channel_type: Option<String>,
    pub budget_micros: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub last_sync_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cached daily metrics row joined with its campaign's upstream id and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DbCampaignMetrics {
    pub id: i64,
    pub campaign_row_id: i64,
    pub campaign_id: String,
    pub campaign_name: String,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub conversions_value: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DbApiActivity {
    pub id: i64,
    pub user_id: String,
    pub api_config_id: Option<i64>,
    pub provider: ApiProvider,
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub title: String,
    pub description: String,
    pub metadata: Json<Value>,
    pub created_at: DateTime<Utc>,
}
