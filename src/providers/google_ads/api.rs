//! GAQL query text and row conversion for the Google Ads search endpoint.

use crate::error::AdpulseError;
use crate::providers::{LiveCampaign, LiveDailyMetrics};
use crate::sync::DateRange;
use adpulse_schema::GoogleAdsRow;

pub(super) const CAMPAIGNS_QUERY: &str = "SELECT campaign.id, campaign.name, campaign.status, \
     campaign.advertising_channel_type, campaign.start_date, campaign.end_date, \
     campaign_budget.amount_micros \
     FROM campaign \
     WHERE campaign.status != 'REMOVED' \
     ORDER BY campaign.id";

/// Cheapest query that proves the credentials can read the configured customer.
pub(super) const CUSTOMER_PROBE_QUERY: &str = "SELECT customer.id FROM customer LIMIT 1";

/// Daily metrics for the given campaigns over an inclusive range.
///
/// Campaign ids are spliced into the query text, so anything that is not a plain integer is
/// rejected rather than escaped.
pub(super) fn metrics_query(
    campaign_ids: &[String],
    range: &DateRange,
) -> Result<String, AdpulseError> {
    if campaign_ids.is_empty() {
        return Err(AdpulseError::InvalidRequest(
            "metrics query needs at least one campaign id".to_string(),
        ));
    }
    if let Some(bad) = campaign_ids
        .iter()
        .find(|id| id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(AdpulseError::InvalidRequest(format!(
            "campaign id must be numeric: {bad:?}"
        )));
    }

    Ok(format!(
        "SELECT campaign.id, campaign.name, segments.date, metrics.impressions, metrics.clicks, \
         metrics.cost_micros, metrics.conversions, metrics.conversions_value \
         FROM campaign \
         WHERE segments.date BETWEEN '{start}' AND '{end}' AND campaign.id IN ({ids}) \
         ORDER BY segments.date",
        start = range.start.format("%Y-%m-%d"),
        end = range.end.format("%Y-%m-%d"),
        ids = campaign_ids.join(", "),
    ))
}

pub(super) fn campaign_from_row(row: GoogleAdsRow) -> Option<LiveCampaign> {
    let campaign = row.campaign?;
    Some(LiveCampaign {
        campaign_id: campaign.id.to_string(),
        name: campaign.name,
        status: campaign.status.unwrap_or_else(|| "UNKNOWN".to_string()),
        channel_type: campaign.advertising_channel_type,
        budget_micros: row.campaign_budget.and_then(|b| b.amount_micros),
        start_date: campaign.start_date,
        end_date: campaign.end_date,
    })
}

/// Rows without a campaign or a date cannot be keyed and are dropped.
pub(super) fn metrics_from_row(row: GoogleAdsRow) -> Option<LiveDailyMetrics> {
    let campaign = row.campaign?;
    let date = row.segments.and_then(|s| s.date)?;
    let metrics = row.metrics.unwrap_or_default();
    Some(LiveDailyMetrics {
        campaign_id: campaign.id.to_string(),
        campaign_name: campaign.name,
        date,
        impressions: metrics.impressions.unwrap_or(0),
        clicks: metrics.clicks.unwrap_or(0),
        cost_micros: metrics.cost_micros.unwrap_or(0),
        conversions: metrics.conversions.unwrap_or(0.0),
        conversions_value: metrics.conversions_value.unwrap_or(0.0),
    })
}
