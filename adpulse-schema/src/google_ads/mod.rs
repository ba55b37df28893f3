mod customers;
mod error;
mod search;

pub use customers::ListAccessibleCustomersResponse;
pub use error::{GoogleAdsErrorBody, GoogleAdsErrorObject, GoogleAdsFailure, GoogleAdsFailureEntry};
pub use search::{
    CampaignBudgetResource, CampaignResource, GoogleAdsRow, MetricsResource, SearchRequest,
    SearchResponse, SegmentsResource,
};
