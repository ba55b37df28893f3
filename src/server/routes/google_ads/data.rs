use super::not_configured;
use crate::error::AdpulseError;
use crate::server::guards::UserIdentity;
use crate::server::router::AdpulseState;
use crate::sync::DateRange;
use axum::extract::rejection::QueryRejection;
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CampaignsQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub refresh: bool,
}

impl MetricsQuery {
    /// Both bounds or neither; without bounds the configured lookback window ending today.
    fn range(&self, lookback_days: u32) -> Result<DateRange, AdpulseError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => DateRange::new(start, end),
            (None, None) => Ok(DateRange::lookback(lookback_days)),
            _ => Err(AdpulseError::InvalidRequest(
                "startDate and endDate must be provided together".to_string(),
            )),
        }
    }
}

fn query_error(e: QueryRejection) -> AdpulseError {
    AdpulseError::InvalidRequest(e.body_text())
}

/// GET /api/google-ads/campaigns
pub async fn get_campaigns(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
    query: Result<Query<CampaignsQuery>, QueryRejection>,
) -> Result<Response, AdpulseError> {
    let Query(query) = query.map_err(query_error)?;
    let report = state
        .read_path
        .get_campaigns(&identity.user_id, query.refresh)
        .await?;
    Ok(match report {
        Some(report) => Json(report).into_response(),
        None => not_configured(),
    })
}

/// GET /api/google-ads/metrics
pub async fn get_metrics(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
    query: Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<Response, AdpulseError> {
    let Query(query) = query.map_err(query_error)?;
    let range = query.range(state.engine.settings().metrics_lookback_days)?;
    let report = state
        .read_path
        .get_metrics(&identity.user_id, range, query.refresh)
        .await?;
    Ok(match report {
        Some(report) => Json(report).into_response(),
        None => not_configured(),
    })
}
