use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use super::models::{ActivityStatus, ActivityType, ApiProvider, ConfigStatus};
use crate::error::AdpulseError;

/// Abstraction for applying a patch payload/envelope to the database.
#[async_trait]
pub trait DbPatchable {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<(), AdpulseError>;
}

/// Credential submission. Secrets must already be vault ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationUpsert {
    pub user_id: String,
    pub user_email: Option<String>,
    pub provider: ApiProvider,
    pub client_id: String,
    pub client_secret: String,
    pub developer_token: String,
    pub refresh_token: String,
    pub customer_id: String,
    pub login_customer_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignUpsert {
    pub api_config_id: i64,
    pub campaign_id: String,
    pub name: String,
    pub status: String,
    pub channel_type: Option<String>,
    pub budget_micros: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsUpsert {
    pub campaign_row_id: i64,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub conversions_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCreate {
    pub user_id: String,
    pub api_config_id: Option<i64>,
    pub provider: ApiProvider,
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub title: String,
    pub description: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationPatch {
    /// `None` => do not change; `Some(v)` => update
    pub status: Option<ConfigStatus>,
    /// `None` => do not change; `Some(v)` => update
    pub token_expiry: Option<DateTime<Utc>>,
    /// `None` => do not change; `Some(v)` => update
    pub last_tested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationPatchEnvelope {
    pub id: i64,
    pub patch: ConfigurationPatch,
}

impl ConfigurationPatchEnvelope {
    pub fn status(id: i64, status: ConfigStatus) -> Self {
        Self {
            id,
            patch: ConfigurationPatch {
                status: Some(status),
                ..Default::default()
            },
        }
    }
}
