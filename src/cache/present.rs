//! Shaping cached or live rows into API responses. Money leaves micros only here.

use crate::db::{DbCampaign, DbCampaignMetrics};
use crate::providers::{LiveCampaign, LiveDailyMetrics};
use crate::sync::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const MICROS_PER_UNIT: f64 = 1_000_000.0;

#[allow(clippy::cast_precision_loss)]
pub fn micros_to_units(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub channel_type: Option<String>,
    /// Daily budget in currency units.
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl From<&DbCampaign> for CampaignView {
    fn from(c: &DbCampaign) -> Self {
        Self {
            id: c.campaign_id.clone(),
            name: c.name.clone(),
            status: c.status.clone(),
            channel_type: c.channel_type.clone(),
            budget: c.budget_micros.map(micros_to_units),
            start_date: c.start_date,
            end_date: c.end_date,
            last_sync_at: Some(c.last_sync_at),
        }
    }
}

impl From<&LiveCampaign> for CampaignView {
    fn from(c: &LiveCampaign) -> Self {
        Self {
            id: c.campaign_id.clone(),
            name: c.name.clone(),
            status: c.status.clone(),
            channel_type: c.channel_type.clone(),
            budget: c.budget_micros.map(micros_to_units),
            start_date: c.start_date,
            end_date: c.end_date,
            last_sync_at: None,
        }
    }
}

/// Summed counters plus ratios derived from the sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsTotals {
    pub impressions: i64,
    pub clicks: i64,
    pub cost: f64,
    pub conversions: f64,
    pub conversions_value: f64,
    /// Click-through rate, percent.
    pub ctr: f64,
    pub average_cpc: f64,
    pub cost_per_conversion: f64,
    /// Conversions per click, percent.
    pub conversion_rate: f64,
}

#[derive(Default)]
struct Accumulator {
    impressions: i64,
    clicks: i64,
    cost_micros: i64,
    conversions: f64,
    conversions_value: f64,
}

impl Accumulator {
    fn add(&mut self, row: &LiveDailyMetrics) {
        self.impressions += row.impressions;
        self.clicks += row.clicks;
        self.cost_micros += row.cost_micros;
        self.conversions += row.conversions;
        self.conversions_value += row.conversions_value;
    }

    #[allow(clippy::cast_precision_loss)]
    fn totals(&self) -> MetricsTotals {
        let cost = micros_to_units(self.cost_micros);
        let impressions = self.impressions as f64;
        let clicks = self.clicks as f64;
        MetricsTotals {
            impressions: self.impressions,
            clicks: self.clicks,
            cost: round2(cost),
            conversions: round2(self.conversions),
            conversions_value: round2(self.conversions_value),
            ctr: round2(ratio(clicks, impressions) * 100.0),
            average_cpc: round2(ratio(cost, clicks)),
            cost_per_conversion: round2(ratio(cost, self.conversions)),
            conversion_rate: round2(ratio(self.conversions, clicks) * 100.0),
        }
    }

    fn daily_point(&self, date: NaiveDate) -> DailyPoint {
        DailyPoint {
            date,
            impressions: self.impressions,
            clicks: self.clicks,
            cost: round2(micros_to_units(self.cost_micros)),
            conversions: round2(self.conversions),
            conversions_value: round2(self.conversions_value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub cost: f64,
    pub conversions: f64,
    pub conversions_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetricsView {
    pub campaign_id: String,
    pub campaign_name: String,
    pub totals: MetricsTotals,
    /// Sorted by date.
    pub daily: Vec<DailyPoint>,
}

/// Metrics for a date range: overall totals, per-campaign breakdown and a combined daily
/// series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub date_range: DateRange,
    pub totals: MetricsTotals,
    pub campaigns: Vec<CampaignMetricsView>,
    pub daily: Vec<DailyPoint>,
}

impl From<&DbCampaignMetrics> for LiveDailyMetrics {
    fn from(m: &DbCampaignMetrics) -> Self {
        Self {
            campaign_id: m.campaign_id.clone(),
            campaign_name: m.campaign_name.clone(),
            date: m.date,
            impressions: m.impressions,
            clicks: m.clicks,
            cost_micros: m.cost_micros,
            conversions: m.conversions,
            conversions_value: m.conversions_value,
        }
    }
}

/// Aggregate daily rows. Campaigns are ordered by name, then id.
pub fn summarize_metrics(range: DateRange, rows: &[LiveDailyMetrics]) -> MetricsSummary {
    let mut overall = Accumulator::default();
    let mut by_date: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
    let mut by_campaign: BTreeMap<&str, (&str, Accumulator, BTreeMap<NaiveDate, Accumulator>)> =
        BTreeMap::new();

    for row in rows {
        overall.add(row);
        by_date.entry(row.date).or_default().add(row);

        let (_, totals, days) = by_campaign
            .entry(row.campaign_id.as_str())
            .or_insert_with(|| {
                (
                    row.campaign_name.as_str(),
                    Accumulator::default(),
                    BTreeMap::new(),
                )
            });
        totals.add(row);
        days.entry(row.date).or_default().add(row);
    }

    let mut campaigns: Vec<CampaignMetricsView> = by_campaign
        .into_iter()
        .map(|(id, (name, totals, days))| CampaignMetricsView {
            campaign_id: id.to_string(),
            campaign_name: name.to_string(),
            totals: totals.totals(),
            daily: days
                .iter()
                .map(|(date, acc)| acc.daily_point(*date))
                .collect(),
        })
        .collect();
    campaigns.sort_by(|a, b| {
        a.campaign_name
            .cmp(&b.campaign_name)
            .then_with(|| a.campaign_id.cmp(&b.campaign_id))
    });

    MetricsSummary {
        date_range: range,
        totals: overall.totals(),
        campaigns,
        daily: by_date
            .iter()
            .map(|(date, acc)| acc.daily_point(*date))
            .collect(),
    }
}
