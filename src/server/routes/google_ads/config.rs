use super::not_configured;
use crate::db::{
    ActivityStatus, ActivityType, ApiProvider, ConfigStatus, ConfigurationPatch,
    ConfigurationPatchEnvelope, ConfigurationUpsert, DbApiConfiguration,
};
use crate::error::AdpulseError;
use crate::providers::{ConnectionCheck, normalize_customer_id};
use crate::server::guards::UserIdentity;
use crate::server::router::AdpulseState;
use crate::sync::google_ads_activity;
use axum::extract::rejection::JsonRejection;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

const CUSTOMER_ID_DIGITS: usize = 10;

/// Credentials as submitted by the user. Secrets are encrypted before they touch the store.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRequest {
    pub client_id: String,
    pub client_secret: String,
    pub developer_token: String,
    pub refresh_token: String,
    pub customer_id: String,
    #[serde(default)]
    pub login_customer_id: Option<String>,
}

impl ConfigurationRequest {
    fn validate(&self) -> Result<(String, Option<String>), AdpulseError> {
        for (field, value) in [
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
            ("developerToken", &self.developer_token),
            ("refreshToken", &self.refresh_token),
        ] {
            if value.trim().is_empty() {
                return Err(AdpulseError::InvalidRequest(format!("{field} is required")));
            }
        }

        let customer_id = normalize_customer_id(&self.customer_id);
        if customer_id.len() != CUSTOMER_ID_DIGITS {
            return Err(AdpulseError::InvalidRequest(
                "customerId must be a 10-digit Google Ads customer id".to_string(),
            ));
        }

        let login_customer_id = match self.login_customer_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let id = normalize_customer_id(raw);
                if id.len() != CUSTOMER_ID_DIGITS {
                    return Err(AdpulseError::InvalidRequest(
                        "loginCustomerId must be a 10-digit Google Ads customer id".to_string(),
                    ));
                }
                Some(id)
            }
        };

        Ok((customer_id, login_customer_id))
    }
}

/// What callers may see of a stored configuration: no secrets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    pub id: i64,
    pub provider: ApiProvider,
    pub client_id: String,
    pub customer_id: String,
    pub login_customer_id: Option<String>,
    pub status: ConfigStatus,
    pub token_expiry: Option<DateTime<Utc>>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DbApiConfiguration> for ConfigurationSummary {
    fn from(c: &DbApiConfiguration) -> Self {
        Self {
            id: c.id,
            provider: c.provider,
            client_id: c.client_id.clone(),
            customer_id: c.customer_id.clone(),
            login_customer_id: c.login_customer_id.clone(),
            status: c.status,
            token_expiry: c.token_expiry,
            last_tested_at: c.last_tested_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub status: ConfigStatus,
    pub message: String,
    pub accessible_customer_ids: Vec<String>,
    /// The configured customer (or its manager) appears among the accessible accounts.
    pub customer_accessible: bool,
    pub tested_at: DateTime<Utc>,
}

/// GET /api/google-ads/config
pub async fn get_config(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
) -> Result<Response, AdpulseError> {
    let config = state
        .db
        .get_user_configuration(&identity.user_id, ApiProvider::GoogleAds)
        .await?;
    Ok(match config {
        Some(config) => Json(json!({ "configuration": ConfigurationSummary::from(&config) }))
            .into_response(),
        None => not_configured(),
    })
}

/// PUT /api/google-ads/config
///
/// Saves (or replaces) the caller's credentials, then immediately tests them.
pub async fn put_config(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
    payload: Result<Json<ConfigurationRequest>, JsonRejection>,
) -> Result<Response, AdpulseError> {
    let Json(request) = payload.map_err(|e| AdpulseError::InvalidRequest(e.body_text()))?;
    let (customer_id, login_customer_id) = request.validate()?;

    let vault = state.engine.vault();
    let upsert = ConfigurationUpsert {
        user_id: identity.user_id.clone(),
        user_email: identity.email.clone(),
        provider: ApiProvider::GoogleAds,
        client_id: request.client_id.trim().to_string(),
        client_secret: vault.encrypt(request.client_secret.trim())?,
        developer_token: vault.encrypt(request.developer_token.trim())?,
        refresh_token: vault.encrypt(request.refresh_token.trim())?,
        customer_id: customer_id.clone(),
        login_customer_id: login_customer_id.clone(),
    };
    let config_id = state.db.upsert_configuration(upsert).await?;
    info!(config_id, user_id = %identity.user_id, "Google Ads configuration saved");

    state
        .engine
        .recorder()
        .record(google_ads_activity(
            &identity.user_id,
            Some(config_id),
            ActivityType::ConfigurationSaved,
            ActivityStatus::Success,
            "Google Ads configuration saved",
            format!("Credentials saved for customer {customer_id}"),
            json!({ "customerId": customer_id, "loginCustomerId": login_customer_id }),
        ))
        .await;

    let config = state
        .db
        .get_configuration(config_id)
        .await?
        .ok_or_else(|| {
            AdpulseError::UnexpectedError(format!("configuration {config_id} vanished"))
        })?;
    let test = run_connection_test(&state, &config).await?;

    let config = state.db.get_configuration(config_id).await?.unwrap_or(config);
    Ok(Json(json!({
        "configuration": ConfigurationSummary::from(&config),
        "connectionTest": test,
    }))
    .into_response())
}

/// POST /api/google-ads/config/test
pub async fn test_config(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
) -> Result<Response, AdpulseError> {
    let Some(config) = state
        .db
        .get_user_configuration(&identity.user_id, ApiProvider::GoogleAds)
        .await?
    else {
        return Ok(not_configured());
    };

    let test = run_connection_test(&state, &config).await?;
    Ok(Json(json!({ "connectionTest": test })).into_response())
}

/// DELETE /api/google-ads/config
pub async fn delete_config(
    State(state): State<AdpulseState>,
    identity: UserIdentity,
) -> Result<Response, AdpulseError> {
    let Some(config) = state
        .db
        .get_user_configuration(&identity.user_id, ApiProvider::GoogleAds)
        .await?
    else {
        return Ok(not_configured());
    };

    let deleted = state
        .db
        .delete_configuration(config.id, &identity.user_id)
        .await?;
    if deleted {
        info!(
            config_id = config.id,
            user_id = %identity.user_id,
            "Google Ads configuration deleted"
        );
        // The row is gone, so the activity cannot reference it; the id rides in metadata.
        state
            .engine
            .recorder()
            .record(google_ads_activity(
                &identity.user_id,
                None,
                ActivityType::ConfigurationDeleted,
                ActivityStatus::Success,
                "Google Ads configuration deleted",
                format!(
                    "Removed configuration for customer {} and its cached data",
                    config.customer_id
                ),
                json!({ "configId": config.id, "customerId": config.customer_id }),
            ))
            .await;
    }

    Ok(Json(json!({ "deleted": deleted })).into_response())
}

/// Test stored credentials against Google Ads and persist the verdict.
///
/// Only store failures are returned as errors; upstream and decryption failures become an
/// `ERROR` status on the configuration.
pub(crate) async fn run_connection_test(
    state: &AdpulseState,
    config: &DbApiConfiguration,
) -> Result<ConnectionTestResult, AdpulseError> {
    let tested_at = Utc::now();
    let outcome: Result<ConnectionCheck, String> = match state.engine.decrypt_credentials(config)
    {
        Err(e) => Err(format!("Stored credentials could not be decrypted: {e}")),
        Ok(creds) => match state.engine.connector().connect(creds).await {
            Ok(platform) => platform.test_connection().await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        },
    };

    let (status, token_expiry) = match &outcome {
        Ok(check) => (ConfigStatus::Active, check.token_expiry),
        Err(_) => (ConfigStatus::Error, None),
    };
    state
        .db
        .patch_configuration(ConfigurationPatchEnvelope {
            id: config.id,
            patch: ConfigurationPatch {
                status: Some(status),
                token_expiry,
                last_tested_at: Some(tested_at),
            },
        })
        .await?;

    let (activity_status, title, message, accessible, customer_accessible) = match outcome {
        Ok(check) => {
            info!(
                config_id = config.id,
                accessible = check.accessible_customer_ids.len(),
                "Connection test passed"
            );
            (
                ActivityStatus::Success,
                "Connection test passed",
                format!(
                    "Connected to Google Ads; {} accessible customer account(s)",
                    check.accessible_customer_ids.len()
                ),
                check.accessible_customer_ids,
                check.customer_accessible,
            )
        }
        Err(error) => {
            warn!(config_id = config.id, error = %error, "Connection test failed");
            (
                ActivityStatus::Error,
                "Connection test failed",
                error,
                Vec::new(),
                false,
            )
        }
    };

    state
        .engine
        .recorder()
        .record(google_ads_activity(
            &config.user_id,
            Some(config.id),
            ActivityType::ConnectionTest,
            activity_status,
            title,
            message.clone(),
            json!({
                "customerId": config.customer_id,
                "accessibleCustomerIds": accessible,
                "customerAccessible": customer_accessible,
                "status": status,
            }),
        ))
        .await;

    Ok(ConnectionTestResult {
        success: status == ConfigStatus::Active,
        status,
        message,
        accessible_customer_ids: accessible,
        customer_accessible,
        tested_at,
    })
}
