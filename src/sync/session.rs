use super::activity::{ActivityRecorder, batch_status, google_ads_activity};
use super::{BatchOutcome, DateRange};
use crate::config::SyncConfig;
use crate::db::{
    ActivityStatus, ActivityType, CampaignUpsert, ConfigStatus, ConfigurationPatchEnvelope,
    DbActorHandle, DbApiConfiguration, DbCampaign, MetricsUpsert,
};
use crate::providers::{AdsPlatform, LiveDailyMetrics};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

const MIN_HISTORICAL_YEARS: u32 = 1;
const MAX_HISTORICAL_YEARS: u32 = 5;

/// One configuration bound to one authenticated platform client.
///
/// Every batch method is best effort: it never returns an error, collects per-item failures,
/// and writes exactly one activity row describing the run.
pub struct SyncSession {
    config: DbApiConfiguration,
    platform: Arc<dyn AdsPlatform>,
    db: DbActorHandle,
    recorder: ActivityRecorder,
    settings: Arc<SyncConfig>,
}

impl SyncSession {
    pub(crate) fn new(
        config: DbApiConfiguration,
        platform: Arc<dyn AdsPlatform>,
        db: DbActorHandle,
        recorder: ActivityRecorder,
        settings: Arc<SyncConfig>,
    ) -> Self {
        Self {
            config,
            platform,
            db,
            recorder,
            settings,
        }
    }

    pub fn config_id(&self) -> i64 {
        self.config.id
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    /// The authenticated client, for uncached live reads.
    pub fn platform(&self) -> &Arc<dyn AdsPlatform> {
        &self.platform
    }

    /// Pull the live campaign list and upsert every entry. Cached campaigns missing from the
    /// live list are left alone.
    pub async fn sync_campaigns(&self) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let config_id = self.config.id;

        let live = match self.platform.get_campaigns().await {
            Ok(live) => live,
            Err(e) => {
                if e.is_auth_failure() {
                    self.set_status(ConfigStatus::Error).await;
                }
                let errors = vec![format!("Failed to fetch campaigns: {e}")];
                warn!(config_id, sync_run_id = %run_id, error = %e, "Campaign fetch failed");
                self.recorder
                    .record(google_ads_activity(
                        &self.config.user_id,
                        Some(config_id),
                        ActivityType::CampaignSync,
                        ActivityStatus::Error,
                        "Campaign sync failed",
                        format!("Could not fetch campaigns from Google Ads: {e}"),
                        json!({
                            "syncRunId": run_id.to_string(),
                            "campaignsFetched": 0,
                            "campaignsSynced": 0,
                            "errors": errors,
                            "durationMs": elapsed_ms(started),
                        }),
                    ))
                    .await;
                return BatchOutcome { count: 0, errors };
            }
        };

        if self.config.status == ConfigStatus::Error {
            self.set_status(ConfigStatus::Active).await;
        }

        let synced_at = Utc::now();
        let mut outcome = BatchOutcome::default();
        for campaign in &live {
            let upsert = CampaignUpsert {
                api_config_id: config_id,
                campaign_id: campaign.campaign_id.clone(),
                name: campaign.name.clone(),
                status: campaign.status.clone(),
                channel_type: campaign.channel_type.clone(),
                budget_micros: campaign.budget_micros,
                start_date: campaign.start_date,
                end_date: campaign.end_date,
                synced_at,
            };
            match self.db.upsert_campaign(upsert).await {
                Ok(_) => outcome.count += 1,
                Err(e) => outcome.errors.push(format!(
                    "Campaign {} ({}): {e}",
                    campaign.campaign_id, campaign.name
                )),
            }
        }

        let status = batch_status(outcome.count, &outcome.errors);
        info!(
            config_id,
            sync_run_id = %run_id,
            fetched = live.len(),
            synced = outcome.count,
            errors = outcome.errors.len(),
            "Campaign sync finished"
        );
        self.recorder
            .record(google_ads_activity(
                &self.config.user_id,
                Some(config_id),
                ActivityType::CampaignSync,
                status,
                campaign_title(status),
                format!(
                    "Synced {} of {} campaigns from Google Ads",
                    outcome.count,
                    live.len()
                ),
                json!({
                    "syncRunId": run_id.to_string(),
                    "campaignsFetched": live.len(),
                    "campaignsSynced": outcome.count,
                    "errors": outcome.errors,
                    "durationMs": elapsed_ms(started),
                }),
            ))
            .await;

        outcome
    }

    /// Fetch and upsert daily metrics for every cached campaign, one upstream call per
    /// campaign so a bad campaign cannot sink the others.
    pub async fn sync_metrics(&self, range: Option<DateRange>) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let config_id = self.config.id;
        let range =
            range.unwrap_or_else(|| DateRange::lookback(self.settings.metrics_lookback_days));

        let mut outcome = BatchOutcome::default();
        let mut campaigns_processed = 0usize;
        match self.db.list_campaigns(config_id).await {
            Ok(campaigns) => {
                for campaign in &campaigns {
                    match self
                        .platform
                        .get_metrics(std::slice::from_ref(&campaign.campaign_id), &range)
                        .await
                    {
                        Ok(rows) => {
                            campaigns_processed += 1;
                            let lookup =
                                HashMap::from([(campaign.campaign_id.as_str(), campaign.id)]);
                            self.store_metrics(&lookup, rows, &mut outcome).await;
                        }
                        Err(e) => outcome.errors.push(format!(
                            "Campaign {} ({}): {e}",
                            campaign.campaign_id, campaign.name
                        )),
                    }
                }
            }
            Err(e) => outcome
                .errors
                .push(format!("Failed to load cached campaigns: {e}")),
        }

        let status = if campaigns_processed == 0 && !outcome.errors.is_empty() {
            ActivityStatus::Error
        } else {
            batch_status(outcome.count.max(campaigns_processed), &outcome.errors)
        };
        info!(
            config_id,
            sync_run_id = %run_id,
            start = %range.start,
            end = %range.end,
            records = outcome.count,
            errors = outcome.errors.len(),
            "Metrics sync finished"
        );
        self.recorder
            .record(google_ads_activity(
                &self.config.user_id,
                Some(config_id),
                ActivityType::MetricsSync,
                status,
                metrics_title(status),
                format!(
                    "Synced {} daily metrics records for {} to {}",
                    outcome.count, range.start, range.end
                ),
                json!({
                    "syncRunId": run_id.to_string(),
                    "dateRange": range,
                    "campaignsProcessed": campaigns_processed,
                    "recordsSynced": outcome.count,
                    "errors": outcome.errors,
                    "durationMs": elapsed_ms(started),
                }),
            ))
            .await;

        outcome
    }

    /// Backfill `years_back` years (clamped to 1..=5) in bounded windows, oldest first.
    pub async fn sync_historical_metrics(&self, years_back: u32) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let config_id = self.config.id;
        let years = years_back.clamp(MIN_HISTORICAL_YEARS, MAX_HISTORICAL_YEARS);
        let range = DateRange::years_back(years, Utc::now().date_naive());
        let windows = range.chunks(self.settings.historical_chunk_days);

        let mut outcome = BatchOutcome::default();
        let mut windows_ok = 0usize;
        match self.db.list_campaigns(config_id).await {
            Ok(campaigns) if campaigns.is_empty() => {}
            Ok(campaigns) => {
                let ids: Vec<String> = campaigns.iter().map(|c| c.campaign_id.clone()).collect();
                let lookup = row_lookup(&campaigns);
                for window in &windows {
                    match self.platform.get_metrics(&ids, window).await {
                        Ok(rows) => {
                            windows_ok += 1;
                            self.store_metrics(&lookup, rows, &mut outcome).await;
                        }
                        Err(e) => outcome.errors.push(format!(
                            "Window {} to {}: {e}",
                            window.start, window.end
                        )),
                    }
                }
            }
            Err(e) => outcome
                .errors
                .push(format!("Failed to load cached campaigns: {e}")),
        }

        let status = if windows_ok == 0 && !outcome.errors.is_empty() {
            ActivityStatus::Error
        } else {
            batch_status(outcome.count.max(windows_ok), &outcome.errors)
        };
        info!(
            config_id,
            sync_run_id = %run_id,
            years,
            windows = windows.len(),
            records = outcome.count,
            errors = outcome.errors.len(),
            "Historical metrics sync finished"
        );
        self.recorder
            .record(google_ads_activity(
                &self.config.user_id,
                Some(config_id),
                ActivityType::HistoricalSync,
                status,
                historical_title(status),
                format!(
                    "Backfilled {} daily metrics records over {years} year(s) ({} to {})",
                    outcome.count, range.start, range.end
                ),
                json!({
                    "syncRunId": run_id.to_string(),
                    "yearsBack": years,
                    "dateRange": range,
                    "windows": windows.len(),
                    "windowsSynced": windows_ok,
                    "recordsSynced": outcome.count,
                    "errors": outcome.errors,
                    "durationMs": elapsed_ms(started),
                }),
            ))
            .await;

        outcome
    }

    /// Upsert rows whose campaign is known; each row failure is recorded on its own.
    async fn store_metrics(
        &self,
        lookup: &HashMap<&str, i64>,
        rows: Vec<LiveDailyMetrics>,
        outcome: &mut BatchOutcome,
    ) {
        for row in rows {
            let Some(&campaign_row_id) = lookup.get(row.campaign_id.as_str()) else {
                outcome.errors.push(format!(
                    "Campaign {} on {}: not in cache",
                    row.campaign_id, row.date
                ));
                continue;
            };
            let upsert = MetricsUpsert {
                campaign_row_id,
                date: row.date,
                impressions: row.impressions,
                clicks: row.clicks,
                cost_micros: row.cost_micros,
                conversions: row.conversions,
                conversions_value: row.conversions_value,
            };
            match self.db.upsert_metrics(upsert).await {
                Ok(()) => outcome.count += 1,
                Err(e) => outcome.errors.push(format!(
                    "Campaign {} on {}: {e}",
                    row.campaign_id, row.date
                )),
            }
        }
    }

    async fn set_status(&self, status: ConfigStatus) {
        let config_id = self.config.id;
        if let Err(e) = self
            .db
            .patch_configuration(ConfigurationPatchEnvelope::status(config_id, status))
            .await
        {
            warn!(config_id, status = %status, error = %e, "Failed to update configuration status");
        } else {
            info!(config_id, status = %status, "Configuration status changed by sync outcome");
        }
    }
}

fn row_lookup(campaigns: &[DbCampaign]) -> HashMap<&str, i64> {
    campaigns
        .iter()
        .map(|c| (c.campaign_id.as_str(), c.id))
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn campaign_title(status: ActivityStatus) -> &'static str {
    match status {
        ActivityStatus::Success => "Campaign sync completed",
        ActivityStatus::Warning => "Campaign sync completed with errors",
        ActivityStatus::Error => "Campaign sync failed",
    }
}

fn metrics_title(status: ActivityStatus) -> &'static str {
    match status {
        ActivityStatus::Success => "Metrics sync completed",
        ActivityStatus::Warning => "Metrics sync completed with errors",
        ActivityStatus::Error => "Metrics sync failed",
    }
}

fn historical_title(status: ActivityStatus) -> &'static str {
    match status {
        ActivityStatus::Success => "Historical sync completed",
        ActivityStatus::Warning => "Historical sync completed with errors",
        ActivityStatus::Error => "Historical sync failed",
    }
}
