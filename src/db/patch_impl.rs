//! ConfigurationPatchEnvelope -> DbPatchable implementation.
//!
//! This sits in the `db` module because it contains SQL/table knowledge.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::patch::{ConfigurationPatch, ConfigurationPatchEnvelope, DbPatchable};
use crate::error::AdpulseError;

#[async_trait]
impl DbPatchable for ConfigurationPatchEnvelope {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<(), AdpulseError> {
        let id = self.id;
        let ConfigurationPatch {
            status,
            token_expiry,
            last_tested_at,
        } = self.patch.clone();

        let status_set = status.is_some();
        let token_expiry_set = token_expiry.is_some();
        let last_tested_at_set = last_tested_at.is_some();
        let updated_at = Utc::now();

        let res = sqlx::query(
            r"
            UPDATE api_configurations
            SET
                status = COALESCE(?, status),
                token_expiry = COALESCE(?, token_expiry),
                last_tested_at = COALESCE(?, last_tested_at),
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(status)
        .bind(token_expiry)
        .bind(last_tested_at)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;

        let affected = res.rows_affected();
        debug!(
            table = "api_configurations",
            id,
            affected,
            updated_at = %updated_at,
            status_set,
            token_expiry_set,
            last_tested_at_set,
            "db patch applied"
        );

        if affected == 0 {
            return Err(AdpulseError::UnexpectedError(format!(
                "API configuration not found for id={id}"
            )));
        }

        Ok(())
    }
}
