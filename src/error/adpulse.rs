use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;

use super::IsRetryable;
use super::oauth::OauthError;

#[derive(Debug, ThisError)]
pub enum AdpulseError {
    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Google Ads API error ({status} {code}): {message}")]
    GoogleAdsApi {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error(transparent)]
    Oauth(#[from] OauthError),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Credential vault error: {0}")]
    Crypto(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AdpulseError {
    /// Upstream refused the credentials themselves; retrying with the same secrets is pointless.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            AdpulseError::UpstreamStatus(status) | AdpulseError::GoogleAdsApi { status, .. } => {
                matches!(*status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            }
            AdpulseError::Oauth(e) => e.is_rejected_grant(),
            _ => false,
        }
    }

    /// The relational store (or the actor fronting it) is unreachable.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            AdpulseError::DatabaseError(_) | AdpulseError::RactorError(_)
        )
    }
}

impl IntoResponse for AdpulseError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            AdpulseError::DatabaseError(_)
            | AdpulseError::RactorError(_)
            | AdpulseError::UnexpectedError(_)
            | AdpulseError::Crypto(_)
            | AdpulseError::Oauth(OauthError::Other { .. }) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                };
                (status, body)
            }

            AdpulseError::InvalidRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorObject {
                    code: "INVALID_REQUEST".to_string(),
                    message,
                    details: None,
                };
                (status, body)
            }

            AdpulseError::JsonError(_) | AdpulseError::Oauth(OauthError::Parse { .. }) => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorObject {
                    code: "BAD_UPSTREAM_PAYLOAD".to_string(),
                    message: "Failed to parse upstream response.".to_string(),
                    details: None,
                };
                (status, body)
            }

            AdpulseError::Oauth(OauthError::ServerResponse { error, .. }) => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorObject {
                    code: "UPSTREAM_AUTH_REJECTED".to_string(),
                    message: "Google rejected the stored OAuth credentials.".to_string(),
                    details: Some(Value::String(error)),
                };
                (status, body)
            }

            AdpulseError::GoogleAdsApi {
                status: upstream,
                code,
                message,
            } => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorObject {
                    code: "UPSTREAM_ERROR".to_string(),
                    message,
                    details: Some(serde_json::json!({
                        "upstreamStatus": upstream.as_u16(),
                        "upstreamCode": code,
                    })),
                };
                (status, body)
            }

            AdpulseError::Oauth(OauthError::Request(_))
            | AdpulseError::ReqwestError(_)
            | AdpulseError::UrlError(_) => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorObject {
                    code: "UPSTREAM_ERROR".to_string(),
                    message: "Upstream service error.".to_string(),
                    details: None,
                };
                (status, body)
            }

            AdpulseError::UpstreamStatus(code)
            | AdpulseError::Oauth(OauthError::UpstreamStatus(code)) => {
                let (err_code, msg) = match code {
                    StatusCode::TOO_MANY_REQUESTS => {
                        ("RATE_LIMIT", "Upstream rate limit exceeded.")
                    }
                    StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Upstream authentication failed."),
                    StatusCode::FORBIDDEN => ("FORBIDDEN", "Upstream permission denied."),
                    StatusCode::NOT_FOUND => ("NOT_FOUND", "Upstream resource not found."),
                    _ => ("UPSTREAM_ERROR", "An upstream error occurred."),
                };
                (
                    StatusCode::BAD_GATEWAY,
                    ApiErrorObject {
                        code: err_code.to_string(),
                        message: msg.to_string(),
                        details: Some(serde_json::json!({ "upstreamStatus": code.as_u16() })),
                    },
                )
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

impl ApiErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            inner: ApiErrorObject {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

impl IsRetryable for AdpulseError {
    fn is_retryable(&self) -> bool {
        match self {
            AdpulseError::ReqwestError(_) => true,
            AdpulseError::UpstreamStatus(status) | AdpulseError::GoogleAdsApi { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            AdpulseError::Oauth(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_not_retried() {
        let unauthorized = AdpulseError::GoogleAdsApi {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHENTICATED".to_string(),
            message: "bad token".to_string(),
        };
        assert!(unauthorized.is_auth_failure());
        assert!(!unauthorized.is_retryable());

        let rejected = AdpulseError::Oauth(OauthError::ServerResponse {
            error: "invalid_grant".to_string(),
            description: None,
        });
        assert!(rejected.is_auth_failure());
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn throttling_and_server_errors_are_retried() {
        assert!(AdpulseError::UpstreamStatus(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(AdpulseError::UpstreamStatus(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(!AdpulseError::UpstreamStatus(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!AdpulseError::Crypto("bad tag".to_string()).is_retryable());
    }

    #[test]
    fn store_failures_are_classified() {
        assert!(AdpulseError::DatabaseError(sqlx::Error::PoolClosed).is_store_failure());
        assert!(AdpulseError::RactorError("gone".to_string()).is_store_failure());
        assert!(!AdpulseError::InvalidRequest("x".to_string()).is_store_failure());
    }
}
