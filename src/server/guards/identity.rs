use crate::error::ApiErrorBody;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

pub const X_USER_ID: &str = "x-user-id";
pub const X_USER_EMAIL: &str = "x-user-email";

const MAX_USER_ID_LEN: usize = 128;

/// The end user on whose behalf the gateway is calling, resolved from forwarded headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for UserIdentity {
    type Rejection = MissingIdentity;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let user_id = header(X_USER_ID)
            .filter(|id| id.len() <= MAX_USER_ID_LEN)
            .ok_or(MissingIdentity)?;

        Ok(UserIdentity {
            user_id,
            email: header(X_USER_EMAIL),
        })
    }
}

pub struct MissingIdentity;

impl IntoResponse for MissingIdentity {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorBody::new(
                "UNAUTHENTICATED",
                "Missing or invalid x-user-id header",
            )),
        )
            .into_response()
    }
}
