use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Google API error envelope: `{"error": {...}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleAdsErrorBody {
    pub error: GoogleAdsErrorObject,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleAdsErrorObject {
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub details: Vec<Value>,
}

/// The `GoogleAdsFailure` detail carried inside `details`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAdsFailure {
    #[serde(default)]
    pub errors: Vec<GoogleAdsFailureEntry>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAdsFailureEntry {
    #[serde(default)]
    pub error_code: Value,
    #[serde(default)]
    pub message: String,
}

impl GoogleAdsErrorBody {
    /// First `GoogleAdsFailure` found in `details`, if any.
    pub fn failure(&self) -> Option<GoogleAdsFailure> {
        self.error
            .details
            .iter()
            .filter(|detail| {
                detail
                    .get("@type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.ends_with("GoogleAdsFailure"))
            })
            .find_map(|detail| serde_json::from_value(detail.clone()).ok())
    }

    /// Most specific human-readable message available.
    pub fn best_message(&self) -> String {
        self.failure()
            .and_then(|f| f.errors.into_iter().map(|e| e.message).find(|m| !m.is_empty()))
            .unwrap_or_else(|| self.error.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_message_prefers_ads_failure_detail() {
        let raw = r#"{
            "error": {
                "code": 400,
                "message": "Request contains an invalid argument.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.ads.googleads.v18.errors.GoogleAdsFailure",
                    "errors": [{
                        "errorCode": { "authorizationError": "DEVELOPER_TOKEN_NOT_APPROVED" },
                        "message": "The developer token is not approved."
                    }],
                    "requestId": "req-1"
                }]
            }
        }"#;
        let body: GoogleAdsErrorBody = serde_json::from_str(raw).expect("valid error body");
        assert_eq!(body.error.code, 400);
        assert_eq!(body.best_message(), "The developer token is not approved.");
        assert_eq!(
            body.failure().and_then(|f| f.request_id).as_deref(),
            Some("req-1")
        );
    }

    #[test]
    fn best_message_falls_back_to_top_level() {
        let body: GoogleAdsErrorBody = serde_json::from_str(
            r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#,
        )
        .expect("valid error body");
        assert_eq!(
            body.best_message(),
            "Request had invalid authentication credentials."
        );
    }
}
