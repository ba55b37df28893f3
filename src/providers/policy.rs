use crate::error::AdpulseError;
use crate::utils::logging::with_pretty_json_debug;
use adpulse_schema::GoogleAdsErrorBody;

pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

/// Turn a non-success Google Ads response into an [`AdpulseError`].
///
/// Structured error envelopes become [`AdpulseError::GoogleAdsApi`] carrying the most specific
/// message Google gave us; anything else falls back to [`AdpulseError::UpstreamStatus`].
pub async fn classify_upstream_error(resp: reqwest::Response) -> AdpulseError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();

    if let Ok(body) = serde_json::from_slice::<GoogleAdsErrorBody>(&bytes) {
        with_pretty_json_debug(&body, |pretty| {
            tracing::debug!(
                %status,
                upstream_status = %body.error.status,
                body = %pretty,
                "Google Ads structured error"
            );
        });

        let code = if body.error.status.is_empty() {
            status.as_str().to_string()
        } else {
            body.error.status.clone()
        };
        return AdpulseError::GoogleAdsApi {
            status,
            code,
            message: body.best_message(),
        };
    }

    let raw_body = String::from_utf8_lossy(&bytes);
    tracing::debug!(
        %status,
        body = %format!("{:.len$}", raw_body, len = UPSTREAM_BODY_PREVIEW_CHARS),
        "Google Ads unstructured error"
    );

    AdpulseError::UpstreamStatus(status)
}
