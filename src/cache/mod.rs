//! Cache read path: cache-first reads with inline refresh, live fallback and provenance.

mod present;
mod read_path;

pub use present::{
    CampaignMetricsView, CampaignView, DailyPoint, MetricsSummary, MetricsTotals, micros_to_units,
    summarize_metrics,
};
pub use read_path::{CacheReadPath, CampaignsReport, DataSource, MetricsReport, Provenance};
