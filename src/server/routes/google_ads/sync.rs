use super::not_configured;
use crate::error::AdpulseError;
use crate::server::guards::UserIdentity;
use crate::server::router::AdpulseState;
use crate::sync::{ManualSyncRequest, ManualSyncSummary};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::info;

/// POST /api/google-ads/sync
///
/// An empty body means "sync campaigns and recent metrics if the cache is stale".
pub async fn manual_sync(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
    body: Bytes,
) -> Result<Response, AdpulseError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ManualSyncRequest::default()
    } else {
        serde_json::from_slice::<ManualSyncRequest>(&body)
            .map_err(|e| AdpulseError::InvalidRequest(format!("invalid sync request: {e}")))?
    };
    let options = request.to_options();

    let results = state
        .engine
        .sync_user_configurations(&identity.user_id, &options)
        .await?;
    if results.is_empty() {
        return Ok(not_configured());
    }

    let summary = ManualSyncSummary::from_results(results);
    info!(
        user_id = %identity.user_id,
        success = summary.success,
        campaigns = summary.total_campaigns,
        metrics = summary.total_metrics,
        "Manual sync finished"
    );
    Ok(Json(summary).into_response())
}
