#![allow(dead_code)]

use adpulse::config::SyncConfig;
use adpulse::db::{
    ApiProvider, ConfigStatus, ConfigurationPatchEnvelope, ConfigurationUpsert, DbActorHandle,
};
use adpulse::error::AdpulseError;
use adpulse::providers::{
    AdsPlatform, AdsPlatformConnector, ConnectionCheck, GoogleAdsCredentials, LiveCampaign,
    LiveDailyMetrics,
};
use adpulse::sync::{DateRange, MetricsSyncEngine};
use adpulse::vault::CredentialVault;
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct TempDb {
    pub db: DbActorHandle,
    pub path: PathBuf,
}

impl TempDb {
    pub async fn cleanup(self) {
        let _ = tokio::fs::remove_file(&self.path).await;
    }
}

pub async fn temp_db(prefix: &str) -> TempDb {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "adpulse-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    let database_url = format!("sqlite:{}", path.display());
    let db = adpulse::db::spawn(&database_url).await;
    TempDb { db, path }
}

pub fn vault() -> Arc<CredentialVault> {
    Arc::new(CredentialVault::new(&[7u8; 32]))
}

pub fn day(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

/// Save an `ACTIVE` configuration for `user_id` with customer id `customer_id`.
pub async fn seed_configuration(
    db: &DbActorHandle,
    vault: &CredentialVault,
    user_id: &str,
    customer_id: &str,
) -> i64 {
    let id = db
        .upsert_configuration(ConfigurationUpsert {
            user_id: user_id.to_string(),
            user_email: Some(format!("{user_id}@example.com")),
            provider: ApiProvider::GoogleAds,
            client_id: "client-id.apps.googleusercontent.com".to_string(),
            client_secret: vault.encrypt("client-secret").expect("encrypt"),
            developer_token: vault.encrypt("dev-token").expect("encrypt"),
            refresh_token: vault.encrypt("1//refresh").expect("encrypt"),
            customer_id: customer_id.to_string(),
            login_customer_id: None,
        })
        .await
        .expect("upsert configuration");
    db.patch_configuration(ConfigurationPatchEnvelope::status(id, ConfigStatus::Active))
        .await
        .expect("activate configuration");
    id
}

pub fn campaign(id: &str, name: &str) -> LiveCampaign {
    LiveCampaign {
        campaign_id: id.to_string(),
        name: name.to_string(),
        status: "ENABLED".to_string(),
        channel_type: Some("SEARCH".to_string()),
        budget_micros: Some(10_000_000),
        start_date: Some(day("2024-01-01")),
        end_date: None,
    }
}

pub fn metrics_row(
    campaign_id: &str,
    date: NaiveDate,
    impressions: i64,
    clicks: i64,
) -> LiveDailyMetrics {
    LiveDailyMetrics {
        campaign_id: campaign_id.to_string(),
        campaign_name: format!("Campaign {campaign_id}"),
        date,
        impressions,
        clicks,
        cost_micros: clicks * 500_000,
        conversions: 1.0,
        conversions_value: 20.0,
    }
}

/// A scripted upstream answer. Failures become `UpstreamStatus` errors.
#[derive(Clone)]
pub enum Scripted<T> {
    Ok(T),
    Fail(StatusCode),
}

impl<T: Clone> Scripted<T> {
    fn resolve(&self) -> Result<T, AdpulseError> {
        match self {
            Scripted::Ok(v) => Ok(v.clone()),
            Scripted::Fail(status) => Err(AdpulseError::UpstreamStatus(*status)),
        }
    }
}

/// In-memory Google Ads stand-in.
///
/// Campaign answers are consumed front to back; the last one repeats forever. Metrics are
/// keyed by campaign id and filtered by the requested range; an unknown campaign has none.
pub struct FakePlatform {
    campaigns: Mutex<VecDeque<Scripted<Vec<LiveCampaign>>>>,
    metrics: Mutex<HashMap<String, Scripted<Vec<LiveDailyMetrics>>>>,
    connection: Mutex<Scripted<ConnectionCheck>>,
    pub campaign_calls: AtomicUsize,
    pub metrics_calls: AtomicUsize,
}

impl FakePlatform {
    pub fn new(campaigns: Vec<LiveCampaign>) -> Arc<Self> {
        Self::scripted(vec![Scripted::Ok(campaigns)])
    }

    pub fn scripted(campaigns: Vec<Scripted<Vec<LiveCampaign>>>) -> Arc<Self> {
        Arc::new(Self {
            campaigns: Mutex::new(campaigns.into()),
            metrics: Mutex::new(HashMap::new()),
            connection: Mutex::new(Scripted::Ok(ConnectionCheck {
                accessible_customer_ids: vec!["1234567890".to_string()],
                customer_accessible: true,
                token_expiry: None,
            })),
            campaign_calls: AtomicUsize::new(0),
            metrics_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_campaigns(&self, answer: Scripted<Vec<LiveCampaign>>) {
        let mut campaigns = self.campaigns.lock().unwrap();
        campaigns.clear();
        campaigns.push_back(answer);
    }

    pub fn set_metrics(&self, campaign_id: &str, answer: Scripted<Vec<LiveDailyMetrics>>) {
        self.metrics
            .lock()
            .unwrap()
            .insert(campaign_id.to_string(), answer);
    }

    pub fn set_connection(&self, answer: Scripted<ConnectionCheck>) {
        *self.connection.lock().unwrap() = answer;
    }

    pub fn campaign_calls(&self) -> usize {
        self.campaign_calls.load(Ordering::SeqCst)
    }

    pub fn metrics_calls(&self) -> usize {
        self.metrics_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdsPlatform for FakePlatform {
    async fn get_campaigns(&self) -> Result<Vec<LiveCampaign>, AdpulseError> {
        self.campaign_calls.fetch_add(1, Ordering::SeqCst);
        let mut campaigns = self.campaigns.lock().unwrap();
        let answer = if campaigns.len() > 1 {
            campaigns.pop_front()
        } else {
            campaigns.front().cloned()
        };
        answer.map_or_else(|| Ok(Vec::new()), |a| a.resolve())
    }

    async fn get_metrics(
        &self,
        campaign_ids: &[String],
        range: &DateRange,
    ) -> Result<Vec<LiveDailyMetrics>, AdpulseError> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        let metrics = self.metrics.lock().unwrap();
        let mut out = Vec::new();
        for id in campaign_ids {
            if let Some(answer) = metrics.get(id) {
                out.extend(
                    answer
                        .resolve()?
                        .into_iter()
                        .filter(|row| range.contains(row.date)),
                );
            }
        }
        Ok(out)
    }

    async fn test_connection(&self) -> Result<ConnectionCheck, AdpulseError> {
        self.connection.lock().unwrap().resolve()
    }
}

/// Hands out a [`FakePlatform`] per customer id, or the default one.
pub struct FakeConnector {
    default: Arc<FakePlatform>,
    by_customer: HashMap<String, Arc<FakePlatform>>,
    pub connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(default: Arc<FakePlatform>) -> Arc<Self> {
        Arc::new(Self {
            default,
            by_customer: HashMap::new(),
            connects: AtomicUsize::new(0),
        })
    }

    pub fn with_customers(
        default: Arc<FakePlatform>,
        by_customer: Vec<(&str, Arc<FakePlatform>)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            default,
            by_customer: by_customer
                .into_iter()
                .map(|(id, p)| (id.to_string(), p))
                .collect(),
            connects: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AdsPlatformConnector for FakeConnector {
    async fn connect(
        &self,
        creds: GoogleAdsCredentials,
    ) -> Result<Arc<dyn AdsPlatform>, AdpulseError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        assert_eq!(creds.refresh_token, "1//refresh", "secrets must be decrypted");
        let platform: Arc<dyn AdsPlatform> = self
            .by_customer
            .get(&creds.customer_id)
            .unwrap_or(&self.default)
            .clone();
        Ok(platform)
    }
}

pub fn engine(
    db: &DbActorHandle,
    vault: Arc<CredentialVault>,
    connector: Arc<FakeConnector>,
) -> MetricsSyncEngine {
    MetricsSyncEngine::new(db.clone(), vault, connector, Arc::new(SyncConfig::default()))
}
