use super::present::{CampaignView, MetricsSummary, summarize_metrics};
use crate::db::{
    ActivityStatus, ActivityType, ApiProvider, DbActorHandle, DbApiConfiguration, DbCampaign,
};
use crate::error::AdpulseError;
use crate::providers::{LiveCampaign, LiveDailyMetrics};
use crate::sync::{DateRange, MetricsSyncEngine, SyncOptions, google_ads_activity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Cache,
    LiveApiFallback,
}

/// Where a response came from and how old it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub data_source: DataSource,
    /// Seconds since `last_sync_at`; only for cache responses with at least one campaign.
    pub cache_age_seconds: Option<i64>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Provenance {
    fn cache(last_sync_at: Option<DateTime<Utc>>) -> Self {
        Self {
            data_source: DataSource::Cache,
            cache_age_seconds: last_sync_at.map(|t| (Utc::now() - t).num_seconds().max(0)),
            last_sync_at,
        }
    }

    fn live() -> Self {
        Self {
            data_source: DataSource::LiveApiFallback,
            cache_age_seconds: None,
            last_sync_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignsReport {
    pub campaigns: Vec<CampaignView>,
    #[serde(flatten)]
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    #[serde(flatten)]
    pub summary: MetricsSummary,
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// Cache-first reads for one user's Google Ads data.
///
/// Stale caches are refreshed inline before reading and sync failures are swallowed. An empty
/// cache falls back to one uncached live call whose result is never written back.
#[derive(Clone)]
pub struct CacheReadPath {
    db: DbActorHandle,
    engine: MetricsSyncEngine,
}

impl CacheReadPath {
    pub fn new(db: DbActorHandle, engine: MetricsSyncEngine) -> Self {
        Self { db, engine }
    }

    /// `Ok(None)` when the user has no Google Ads configuration.
    pub async fn get_campaigns(
        &self,
        user_id: &str,
        force_refresh: bool,
    ) -> Result<Option<CampaignsReport>, AdpulseError> {
        let Some(config) = self
            .db
            .get_user_configuration(user_id, ApiProvider::GoogleAds)
            .await?
        else {
            return Ok(None);
        };

        self.refresh_if_stale(&config, force_refresh, None).await;

        let cached = self.db.list_campaigns(config.id).await?;
        if cached.is_empty()
            && let Some(live) = self.live_campaigns(&config).await
        {
            return Ok(Some(CampaignsReport {
                campaigns: live.iter().map(CampaignView::from).collect(),
                provenance: Provenance::live(),
            }));
        }

        Ok(Some(CampaignsReport {
            provenance: Provenance::cache(latest_sync(&cached)),
            campaigns: cached.iter().map(CampaignView::from).collect(),
        }))
    }

    /// `Ok(None)` when the user has no Google Ads configuration.
    pub async fn get_metrics(
        &self,
        user_id: &str,
        range: DateRange,
        force_refresh: bool,
    ) -> Result<Option<MetricsReport>, AdpulseError> {
        let Some(config) = self
            .db
            .get_user_configuration(user_id, ApiProvider::GoogleAds)
            .await?
        else {
            return Ok(None);
        };

        self.refresh_if_stale(&config, force_refresh, Some(range))
            .await;

        let cached = self
            .db
            .list_metrics(config.id, range.start, range.end)
            .await?;
        if cached.is_empty()
            && let Some(live) = self.live_metrics(&config, range).await
        {
            return Ok(Some(MetricsReport {
                summary: summarize_metrics(range, &live),
                provenance: Provenance::live(),
            }));
        }

        let campaigns = self.db.list_campaigns(config.id).await?;
        let rows: Vec<LiveDailyMetrics> = cached.iter().map(LiveDailyMetrics::from).collect();
        Ok(Some(MetricsReport {
            summary: summarize_metrics(range, &rows),
            provenance: Provenance::cache(latest_sync(&campaigns)),
        }))
    }

    async fn refresh_if_stale(
        &self,
        config: &DbApiConfiguration,
        force_refresh: bool,
        range: Option<DateRange>,
    ) {
        if !force_refresh && !self.engine.should_sync(config.id).await {
            debug!(config_id = config.id, "Serving fresh cache");
            return;
        }

        let options = SyncOptions {
            force_sync: true,
            date_range: range,
            ..SyncOptions::default()
        };
        let result = self.engine.sync_configuration(config, &options).await;
        if !result.success {
            warn!(
                config_id = config.id,
                errors = ?result.errors,
                "Inline sync before read failed, serving existing cache"
            );
        }
    }

    /// Direct platform read for an empty cache. `None` on any failure.
    async fn live_campaigns(&self, config: &DbApiConfiguration) -> Option<Vec<LiveCampaign>> {
        let outcome = match self.engine.create_from_api_config(config.id).await {
            Ok(Some(session)) => session
                .platform()
                .get_campaigns()
                .await
                .map_err(|e| e.to_string()),
            Ok(None) => Err("configuration is not usable".to_string()),
            Err(e) => Err(e.to_string()),
        };
        self.record_fallback(config, "campaigns", outcome.as_ref().map(Vec::len))
            .await;
        outcome.ok()
    }

    async fn live_metrics(
        &self,
        config: &DbApiConfiguration,
        range: DateRange,
    ) -> Option<Vec<LiveDailyMetrics>> {
        let outcome = match self.engine.create_from_api_config(config.id).await {
            Ok(Some(session)) => {
                let platform = session.platform();
                match platform.get_campaigns().await {
                    Ok(campaigns) if campaigns.is_empty() => Ok(Vec::new()),
                    Ok(campaigns) => {
                        let ids: Vec<String> =
                            campaigns.into_iter().map(|c| c.campaign_id).collect();
                        platform
                            .get_metrics(&ids, &range)
                            .await
                            .map_err(|e| e.to_string())
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
            Ok(None) => Err("configuration is not usable".to_string()),
            Err(e) => Err(e.to_string()),
        };
        self.record_fallback(config, "metrics", outcome.as_ref().map(Vec::len))
            .await;
        outcome.ok()
    }

    async fn record_fallback(
        &self,
        config: &DbApiConfiguration,
        resource: &str,
        outcome: Result<usize, &String>,
    ) {
        let (status, title, description, metadata) = match outcome {
            Ok(records) => {
                info!(config_id = config.id, resource, records, "Served live fallback");
                (
                    ActivityStatus::Success,
                    "Live data served",
                    format!(
                        "Cache was empty; served {records} {resource} records live from Google Ads"
                    ),
                    json!({ "resource": resource, "records": records }),
                )
            }
            Err(error) => {
                warn!(config_id = config.id, resource, error = %error, "Live fallback failed");
                (
                    ActivityStatus::Error,
                    "Live data fallback failed",
                    format!("Cache was empty and the live {resource} request failed: {error}"),
                    json!({ "resource": resource, "error": error }),
                )
            }
        };

        self.engine
            .recorder()
            .record(google_ads_activity(
                &config.user_id,
                Some(config.id),
                ActivityType::LiveFallback,
                status,
                title,
                description,
                metadata,
            ))
            .await;
    }
}

fn latest_sync(campaigns: &[DbCampaign]) -> Option<DateTime<Utc>> {
    campaigns.iter().map(|c| c.last_sync_at).max()
}
