mod api;
mod client;
mod token;

pub use client::{GoogleAdsClient, GoogleAdsConnector};

pub const GOOGLE_ADS_USER_AGENT: &str = concat!("adpulse/", env!("CARGO_PKG_VERSION"));
