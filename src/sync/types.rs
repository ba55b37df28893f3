use super::DateRange;
use serde::{Deserialize, Serialize};

/// What a bulk or per-configuration sync should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Ignore the staleness window.
    pub force_sync: bool,
    pub sync_campaigns: bool,
    pub sync_metrics: bool,
    /// Metrics range; `None` means the trailing lookback window.
    pub date_range: Option<DateRange>,
    /// Replace the metrics pass with a chunked backfill over this many years.
    pub historical_years: Option<u32>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force_sync: false,
            sync_campaigns: true,
            sync_metrics: true,
            date_range: None,
            historical_years: None,
        }
    }
}

/// Result of one best-effort batch: how many items landed and what went wrong with the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub count: usize,
    pub errors: Vec<String>,
}

/// Per-configuration summary of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub config_id: i64,
    pub user_id: String,
    pub success: bool,
    /// Fresh cache and not forced: nothing was fetched.
    pub skipped: bool,
    pub campaigns_synced: usize,
    pub metrics_records_synced: usize,
    pub errors: Vec<String>,
}

impl SyncResult {
    pub(crate) fn new(config_id: i64, user_id: impl Into<String>) -> Self {
        Self {
            config_id,
            user_id: user_id.into(),
            success: true,
            skipped: false,
            campaigns_synced: 0,
            metrics_records_synced: 0,
            errors: Vec::new(),
        }
    }

    pub(crate) fn skipped(config_id: i64, user_id: impl Into<String>) -> Self {
        Self {
            skipped: true,
            ..Self::new(config_id, user_id)
        }
    }

    pub(crate) fn failed(config_id: i64, user_id: impl Into<String>, error: String) -> Self {
        Self {
            success: false,
            errors: vec![error],
            ..Self::new(config_id, user_id)
        }
    }

    pub(crate) fn absorb_errors(&mut self, errors: Vec<String>) {
        self.errors.extend(errors);
        self.success = self.errors.is_empty();
    }
}

/// Body of the manual sync trigger.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSyncRequest {
    #[serde(default)]
    pub force_sync: bool,
    #[serde(default = "default_true")]
    pub sync_campaigns: bool,
    #[serde(default = "default_true")]
    pub sync_metrics: bool,
    #[serde(default)]
    pub historical: bool,
    #[serde(default)]
    pub years_back: Option<u32>,
}

impl Default for ManualSyncRequest {
    fn default() -> Self {
        Self {
            force_sync: false,
            sync_campaigns: true,
            sync_metrics: true,
            historical: false,
            years_back: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Years of history backfilled when `historical` is set without `yearsBack`.
pub const DEFAULT_HISTORICAL_YEARS: u32 = 2;

impl ManualSyncRequest {
    pub fn to_options(&self) -> SyncOptions {
        SyncOptions {
            force_sync: self.force_sync,
            sync_campaigns: self.sync_campaigns,
            sync_metrics: self.sync_metrics,
            date_range: None,
            historical_years: self
                .historical
                .then(|| self.years_back.unwrap_or(DEFAULT_HISTORICAL_YEARS)),
        }
    }
}

/// Aggregated response of the manual sync trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSyncSummary {
    pub success: bool,
    pub total_campaigns: usize,
    pub total_metrics: usize,
    pub configurations: Vec<SyncResult>,
    pub errors: Vec<String>,
}

impl ManualSyncSummary {
    pub fn from_results(configurations: Vec<SyncResult>) -> Self {
        let total_campaigns = configurations.iter().map(|r| r.campaigns_synced).sum();
        let total_metrics = configurations
            .iter()
            .map(|r| r.metrics_records_synced)
            .sum();
        let errors: Vec<String> = configurations
            .iter()
            .flat_map(|r| r.errors.iter().cloned())
            .collect();
        let success = configurations.iter().all(|r| r.success);
        Self {
            success,
            total_campaigns,
            total_metrics,
            configurations,
            errors,
        }
    }
}
