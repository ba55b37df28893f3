use crate::db::{ActivityStatus, ActivityType, DbApiActivity};
use crate::error::AdpulseError;
use crate::server::guards::UserIdentity;
use crate::server::router::AdpulseState;
use axum::extract::rejection::QueryRejection;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesQuery {
    pub limit: Option<u32>,
}

impl ActivitiesQuery {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: i64,
    pub config_id: Option<i64>,
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub title: String,
    pub description: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl From<DbApiActivity> for ActivityView {
    fn from(a: DbApiActivity) -> Self {
        Self {
            id: a.id,
            config_id: a.api_config_id,
            activity_type: a.activity_type,
            status: a.status,
            title: a.title,
            description: a.description,
            metadata: a.metadata.0,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityView>,
}

/// GET /api/google-ads/activities, newest first.
pub async fn list_activities(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
    query: Result<Query<ActivitiesQuery>, QueryRejection>,
) -> Result<Json<ActivitiesResponse>, AdpulseError> {
    let Query(query) = query.map_err(|e| AdpulseError::InvalidRequest(e.body_text()))?;
    let activities = state
        .db
        .list_user_activities(&identity.user_id, query.limit())
        .await?;
    Ok(Json(ActivitiesResponse {
        activities: activities.into_iter().map(ActivityView::from).collect(),
    }))
}
