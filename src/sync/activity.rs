use crate::db::{ActivityCreate, ActivityStatus, ActivityType, ApiProvider, DbActorHandle};
use serde_json::Value;
use tracing::{debug, warn};

/// Append-only audit trail writer.
///
/// Recording is best effort: a failed insert is logged and swallowed so the operation being
/// audited never fails because of its audit row.
#[derive(Clone)]
pub struct ActivityRecorder {
    db: DbActorHandle,
}

impl ActivityRecorder {
    pub fn new(db: DbActorHandle) -> Self {
        Self { db }
    }

    pub async fn record(&self, activity: ActivityCreate) {
        let activity_type = activity.activity_type;
        let status = activity.status;
        let user_id = activity.user_id.clone();
        let config_id = activity.api_config_id;

        match self.db.insert_activity(activity).await {
            Ok(id) => {
                debug!(
                    activity_id = id,
                    user_id = %user_id,
                    config_id = ?config_id,
                    activity_type = ?activity_type,
                    status = ?status,
                    "Activity recorded"
                );
            }
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    config_id = ?config_id,
                    activity_type = ?activity_type,
                    status = ?status,
                    error = %e,
                    "Failed to record activity"
                );
            }
        }
    }
}

/// Shorthand for a Google Ads activity row.
pub fn google_ads_activity(
    user_id: &str,
    api_config_id: Option<i64>,
    activity_type: ActivityType,
    status: ActivityStatus,
    title: impl Into<String>,
    description: impl Into<String>,
    metadata: Value,
) -> ActivityCreate {
    ActivityCreate {
        user_id: user_id.to_string(),
        api_config_id,
        provider: ApiProvider::GoogleAds,
        activity_type,
        status,
        title: title.into(),
        description: description.into(),
        metadata,
    }
}

/// `SUCCESS` with no errors, `WARNING` when some items landed, `ERROR` otherwise.
pub fn batch_status(count: usize, errors: &[String]) -> ActivityStatus {
    if errors.is_empty() {
        ActivityStatus::Success
    } else if count > 0 {
        ActivityStatus::Warning
    } else {
        ActivityStatus::Error
    }
}
