pub mod google_ads;

mod int64;

pub use google_ads::{
    GoogleAdsErrorBody, GoogleAdsRow, ListAccessibleCustomersResponse, SearchRequest,
    SearchResponse,
};
