pub mod google_ads;

mod policy;
mod types;

pub use google_ads::{GoogleAdsClient, GoogleAdsConnector};
pub use policy::{UPSTREAM_BODY_PREVIEW_CHARS, classify_upstream_error};
pub use types::{
    ConnectionCheck, GoogleAdsCredentials, LiveCampaign, LiveDailyMetrics, normalize_customer_id,
};

use crate::error::AdpulseError;
use crate::sync::DateRange;
use async_trait::async_trait;
use std::sync::Arc;

/// An authenticated client bound to one advertiser account.
#[async_trait]
pub trait AdsPlatform: Send + Sync {
    async fn get_campaigns(&self) -> Result<Vec<LiveCampaign>, AdpulseError>;

    /// Daily metrics for the given campaigns over an inclusive date range.
    async fn get_metrics(
        &self,
        campaign_ids: &[String],
        range: &DateRange,
    ) -> Result<Vec<LiveDailyMetrics>, AdpulseError>;

    async fn test_connection(&self) -> Result<ConnectionCheck, AdpulseError>;
}

/// Builds [`AdsPlatform`] clients from decrypted credentials.
///
/// The sync engine and the read path only see this seam, so tests can swap in fakes.
#[async_trait]
pub trait AdsPlatformConnector: Send + Sync {
    async fn connect(
        &self,
        creds: GoogleAdsCredentials,
    ) -> Result<Arc<dyn AdsPlatform>, AdpulseError>;
}
