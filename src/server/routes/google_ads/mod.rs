use crate::error::ApiErrorBody;
use crate::server::router::AdpulseState;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

pub mod activities;
pub mod config;
pub mod data;
pub mod sync;

pub fn router() -> Router<AdpulseState> {
    Router::new()
        .route(
            "/api/google-ads/config",
            get(config::get_config)
                .put(config::put_config)
                .delete(config::delete_config),
        )
        .route("/api/google-ads/config/test", post(config::test_config))
        .route("/api/google-ads/campaigns", get(data::get_campaigns))
        .route("/api/google-ads/metrics", get(data::get_metrics))
        .route("/api/google-ads/sync", post(sync::manual_sync))
        .route("/api/google-ads/activities", get(activities::list_activities))
}

/// 404 for users who never saved Google Ads credentials.
pub(crate) fn not_configured() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorBody::new(
            "NOT_CONFIGURED",
            "Google Ads is not configured for this user.",
        )),
    )
        .into_response()
}
