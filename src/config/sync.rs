use serde::{Deserialize, Serialize};

/// Sync engine tuning managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Staleness window: cached data older than this triggers a refresh.
    /// TOML: `sync.max_age_hours`. Default: `24`.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u32,

    /// Trailing days covered by a metrics sync when no explicit range is given.
    /// TOML: `sync.metrics_lookback_days`. Default: `30`.
    #[serde(default = "default_metrics_lookback_days")]
    pub metrics_lookback_days: u32,

    /// Window size used to split historical backfills into bounded upstream queries.
    /// TOML: `sync.historical_chunk_days`. Default: `90`.
    #[serde(default = "default_historical_chunk_days")]
    pub historical_chunk_days: u32,

    /// Configurations processed concurrently by a bulk sync.
    /// TOML: `sync.concurrency`. Default: `2`.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_age_hours: default_max_age_hours(),
            metrics_lookback_days: default_metrics_lookback_days(),
            historical_chunk_days: default_historical_chunk_days(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_max_age_hours() -> u32 {
    24
}

fn default_metrics_lookback_days() -> u32 {
    30
}

fn default_historical_chunk_days() -> u32 {
    90
}

fn default_concurrency() -> usize {
    2
}
