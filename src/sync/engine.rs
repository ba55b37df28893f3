use super::activity::{ActivityRecorder, google_ads_activity};
use super::session::SyncSession;
use super::types::{SyncOptions, SyncResult};
use crate::config::SyncConfig;
use crate::db::{ActivityStatus, ActivityType, ConfigStatus, DbActorHandle, DbApiConfiguration};
use crate::error::AdpulseError;
use crate::providers::{AdsPlatformConnector, GoogleAdsCredentials, normalize_customer_id};
use crate::vault::CredentialVault;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::{StreamExt, stream};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a configuration could not produce a sync session.
#[derive(Debug, thiserror::Error)]
enum Unusable {
    #[error("Configuration no longer exists")]
    Missing,
    #[error("Configuration is inactive")]
    Inactive,
    #[error("Stored credentials could not be decrypted: {0}")]
    Undecryptable(String),
    #[error("Failed to build Google Ads client: {0}")]
    Client(String),
}

/// A cache synced at `last_sync_at` is stale once strictly more than `max_age_hours` have
/// passed by `now`. Exactly `max_age_hours` still counts as fresh.
pub fn is_stale(last_sync_at: DateTime<Utc>, now: DateTime<Utc>, max_age_hours: u32) -> bool {
    now - last_sync_at > ChronoDuration::hours(i64::from(max_age_hours))
}

/// Decides when to refresh and drives per-configuration sync sessions.
///
/// Holds no mutable state between calls, so any trigger (HTTP, cron binary, read path) can
/// call into it concurrently. Overlapping runs for one configuration converge through the
/// idempotent upserts in the store.
#[derive(Clone)]
pub struct MetricsSyncEngine {
    db: DbActorHandle,
    vault: Arc<CredentialVault>,
    connector: Arc<dyn AdsPlatformConnector>,
    recorder: ActivityRecorder,
    settings: Arc<SyncConfig>,
}

impl MetricsSyncEngine {
    pub fn new(
        db: DbActorHandle,
        vault: Arc<CredentialVault>,
        connector: Arc<dyn AdsPlatformConnector>,
        settings: Arc<SyncConfig>,
    ) -> Self {
        let recorder = ActivityRecorder::new(db.clone());
        Self {
            db,
            vault,
            connector,
            recorder,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncConfig {
        &self.settings
    }

    pub fn recorder(&self) -> &ActivityRecorder {
        &self.recorder
    }

    pub fn connector(&self) -> &Arc<dyn AdsPlatformConnector> {
        &self.connector
    }

    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// Staleness check against the configured `sync.max_age_hours`.
    pub async fn should_sync(&self, config_id: i64) -> bool {
        self.should_sync_with_max_age(config_id, self.settings.max_age_hours)
            .await
    }

    /// True when nothing was ever synced, or the newest `last_sync_at` is strictly older than
    /// `max_age_hours`. A store error answers `true`.
    pub async fn should_sync_with_max_age(&self, config_id: i64, max_age_hours: u32) -> bool {
        match self.db.latest_campaign_sync(config_id).await {
            Ok(None) => true,
            Ok(Some(last_sync_at)) => is_stale(last_sync_at, Utc::now(), max_age_hours),
            Err(e) => {
                warn!(config_id, error = %e, "Staleness check failed, assuming stale");
                true
            }
        }
    }

    /// Decrypt a stored configuration's secrets.
    pub fn decrypt_credentials(
        &self,
        config: &DbApiConfiguration,
    ) -> Result<GoogleAdsCredentials, AdpulseError> {
        Ok(GoogleAdsCredentials {
            client_id: config.client_id.clone(),
            client_secret: self.vault.decrypt(&config.client_secret)?,
            developer_token: self.vault.decrypt(&config.developer_token)?,
            refresh_token: self.vault.decrypt(&config.refresh_token)?,
            customer_id: normalize_customer_id(&config.customer_id),
            login_customer_id: config
                .login_customer_id
                .as_deref()
                .map(normalize_customer_id)
                .filter(|id| !id.is_empty()),
        })
    }

    /// Build a session for a usable configuration.
    ///
    /// `Ok(None)` when the configuration is missing, `INACTIVE`, or its secrets cannot be
    /// decrypted; `Err` only when the store is unreachable.
    pub async fn create_from_api_config(
        &self,
        config_id: i64,
    ) -> Result<Option<SyncSession>, AdpulseError> {
        Ok(self.open_session(config_id).await?.ok())
    }

    async fn open_session(
        &self,
        config_id: i64,
    ) -> Result<Result<SyncSession, Unusable>, AdpulseError> {
        let Some(config) = self.db.get_configuration(config_id).await? else {
            debug!(config_id, "No configuration, no sync session");
            return Ok(Err(Unusable::Missing));
        };

        if config.status == ConfigStatus::Inactive {
            debug!(config_id, "Configuration inactive, no sync session");
            return Ok(Err(Unusable::Inactive));
        }

        let creds = match self.decrypt_credentials(&config) {
            Ok(creds) => creds,
            Err(e) => {
                warn!(config_id, error = %e, "Stored credentials could not be decrypted");
                return Ok(Err(Unusable::Undecryptable(e.to_string())));
            }
        };

        let platform = match self.connector.connect(creds).await {
            Ok(platform) => platform,
            Err(e) => {
                warn!(config_id, error = %e, "Failed to build Google Ads client");
                return Ok(Err(Unusable::Client(e.to_string())));
            }
        };

        Ok(Ok(SyncSession::new(
            config,
            platform,
            self.db.clone(),
            self.recorder.clone(),
            self.settings.clone(),
        )))
    }

    /// Full pipeline for one configuration: staleness gate, session, campaigns, metrics.
    ///
    /// A run that cannot start still leaves one `ERROR` activity naming the reason.
    pub async fn sync_configuration(
        &self,
        config: &DbApiConfiguration,
        options: &SyncOptions,
    ) -> SyncResult {
        let config_id = config.id;
        if !options.force_sync && !self.should_sync(config_id).await {
            debug!(config_id, "Cache fresh, sync skipped");
            return SyncResult::skipped(config_id, config.user_id.clone());
        }

        let session = match self.open_session(config_id).await {
            Ok(Ok(session)) => session,
            Ok(Err(unusable)) => {
                let reason = unusable.to_string();
                // A vanished row cannot be referenced; its id rides in metadata.
                let linked = (!matches!(unusable, Unusable::Missing)).then_some(config_id);
                self.record_not_started(config, linked, options, &reason).await;
                return SyncResult::failed(config_id, config.user_id.clone(), reason);
            }
            Err(e) => {
                warn!(config_id, error = %e, "Store unavailable while loading configuration");
                let reason = format!("Failed to load configuration: {e}");
                self.record_not_started(config, Some(config_id), options, &reason)
                    .await;
                return SyncResult::failed(config_id, config.user_id.clone(), reason);
            }
        };

        let mut result = SyncResult::new(config_id, config.user_id.clone());
        if options.sync_campaigns {
            let outcome = session.sync_campaigns().await;
            result.campaigns_synced = outcome.count;
            result.absorb_errors(outcome.errors);
        }
        if options.sync_metrics {
            let outcome = match options.historical_years {
                Some(years) => session.sync_historical_metrics(years).await,
                None => session.sync_metrics(options.date_range).await,
            };
            result.metrics_records_synced = outcome.count;
            result.absorb_errors(outcome.errors);
        }
        result
    }

    async fn record_not_started(
        &self,
        config: &DbApiConfiguration,
        api_config_id: Option<i64>,
        options: &SyncOptions,
        reason: &str,
    ) {
        let activity_type = if options.sync_campaigns {
            ActivityType::CampaignSync
        } else if options.historical_years.is_some() {
            ActivityType::HistoricalSync
        } else {
            ActivityType::MetricsSync
        };
        self.recorder
            .record(google_ads_activity(
                &config.user_id,
                api_config_id,
                activity_type,
                ActivityStatus::Error,
                "Sync could not start",
                reason,
                json!({
                    "configId": config.id,
                    "customerId": config.customer_id,
                    "forceSync": options.force_sync,
                    "errors": [reason],
                }),
            ))
            .await;
    }

    /// Sync every stored configuration. One configuration failing never stops the others.
    pub async fn sync_all_configurations(
        &self,
        options: &SyncOptions,
    ) -> Result<Vec<SyncResult>, AdpulseError> {
        let configs = self.db.list_configurations().await?;
        Ok(self.run_batch(configs, options).await)
    }

    /// Same pipeline, restricted to one user's configurations.
    pub async fn sync_user_configurations(
        &self,
        user_id: &str,
        options: &SyncOptions,
    ) -> Result<Vec<SyncResult>, AdpulseError> {
        let configs = self.db.list_user_configurations(user_id).await?;
        Ok(self.run_batch(configs, options).await)
    }

    async fn run_batch(
        &self,
        configs: Vec<DbApiConfiguration>,
        options: &SyncOptions,
    ) -> Vec<SyncResult> {
        let total = configs.len();
        let concurrency = self.settings.concurrency.max(1);

        let options = *options;
        let results: Vec<SyncResult> = stream::iter(configs)
            .map(|config| {
                let engine = self.clone();
                async move { engine.sync_configuration(&config, &options).await }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.success).count();
        let skipped = results.iter().filter(|r| r.skipped).count();
        info!(
            total,
            succeeded,
            skipped,
            failed = total - succeeded,
            force_sync = options.force_sync,
            "Sync batch finished"
        );
        results
    }
}
