use super::api::{
    CAMPAIGNS_QUERY, CUSTOMER_PROBE_QUERY, campaign_from_row, metrics_from_row, metrics_query,
};
use super::token::TokenCache;
use super::GOOGLE_ADS_USER_AGENT;
use crate::config::GoogleAdsResolvedConfig;
use crate::error::{AdpulseError, IsRetryable};
use crate::oauth_utils::build_refresh_client;
use crate::providers::{
    AdsPlatform, AdsPlatformConnector, ConnectionCheck, GoogleAdsCredentials, LiveCampaign,
    LiveDailyMetrics, classify_upstream_error,
};
use crate::sync::DateRange;
use adpulse_schema::{GoogleAdsRow, ListAccessibleCustomersResponse, SearchRequest, SearchResponse};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Shared transport for every Google Ads client: one HTTP pool, one rate limiter, one retry
/// policy. Cheap to clone.
#[derive(Clone)]
pub struct GoogleAdsConnector {
    cfg: Arc<GoogleAdsResolvedConfig>,
    http: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    retry_policy: ExponentialBuilder,
}

impl GoogleAdsConnector {
    pub fn new(cfg: Arc<GoogleAdsResolvedConfig>) -> Self {
        let mut headers = HeaderMap::new();
        let mut builder = reqwest::Client::builder()
            .user_agent(GOOGLE_ADS_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.request_timeout_secs));

        if let Some(proxy_url) = cfg.proxy.clone() {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .expect("invalid proxy url for reqwest client");
            builder = builder.proxy(proxy);
        }

        if cfg.enable_multiplexing {
            builder = builder.http2_adaptive_window(true);
        } else {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));

            builder = builder
                .http1_only()
                .pool_max_idle_per_host(0)
                .pool_idle_timeout(Duration::from_secs(0));
        }

        let http = builder
            .default_headers(headers)
            .build()
            .expect("FATAL: initialize Google Ads HTTP client failed");

        let api_tps = cfg.api_tps.max(1);
        let tps_u32 = u32::try_from(api_tps).unwrap_or(u32::MAX);
        let burst_u32 = u32::try_from(api_tps.saturating_mul(2)).unwrap_or(u32::MAX);
        let limiter = Arc::new(RateLimiter::direct(
            Quota::per_second(NonZeroU32::new(tps_u32).unwrap_or(NonZeroU32::MIN))
                .allow_burst(NonZeroU32::new(burst_u32).unwrap_or(NonZeroU32::MIN)),
        ));

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(cfg.retry_max_times)
            .with_jitter();

        Self {
            cfg,
            http,
            limiter,
            retry_policy,
        }
    }

    /// Build a client without going through the trait object.
    pub fn client(&self, creds: GoogleAdsCredentials) -> Result<GoogleAdsClient, AdpulseError> {
        let oauth = build_refresh_client(
            &creds.client_id,
            &creds.client_secret,
            self.cfg.token_url.as_str(),
        )?;
        let token = TokenCache::new(oauth, &creds.refresh_token);
        Ok(GoogleAdsClient {
            transport: self.clone(),
            creds,
            token,
        })
    }
}

#[async_trait]
impl AdsPlatformConnector for GoogleAdsConnector {
    async fn connect(
        &self,
        creds: GoogleAdsCredentials,
    ) -> Result<Arc<dyn AdsPlatform>, AdpulseError> {
        Ok(Arc::new(self.client(creds)?))
    }
}

/// Authenticated Google Ads REST client for one customer account.
pub struct GoogleAdsClient {
    transport: GoogleAdsConnector,
    creds: GoogleAdsCredentials,
    token: TokenCache,
}

impl GoogleAdsClient {
    fn endpoint(&self, path: &str) -> Result<Url, AdpulseError> {
        let cfg = &self.transport.cfg;
        let url = format!(
            "{}/{}/{}",
            cfg.api_base_url.as_str().trim_end_matches('/'),
            cfg.api_version,
            path
        );
        Ok(Url::parse(&url)?)
    }

    fn ads_headers(&self) -> Result<HeaderMap, AdpulseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "developer-token",
            HeaderValue::from_str(&self.creds.developer_token).map_err(|_| {
                AdpulseError::InvalidRequest("developer token is not a valid header value".into())
            })?,
        );
        if let Some(login_customer_id) = self
            .creds
            .login_customer_id
            .as_deref()
            .filter(|id| !id.is_empty())
        {
            headers.insert(
                "login-customer-id",
                HeaderValue::from_str(login_customer_id).map_err(|_| {
                    AdpulseError::InvalidRequest(
                        "login customer id is not a valid header value".into(),
                    )
                })?,
            );
        }
        Ok(headers)
    }

    /// One authenticated call, rate limited and retried on transient failures.
    async fn send_json<T, B>(&self, url: &Url, body: Option<&B>) -> Result<T, AdpulseError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + Sync,
    {
        let headers = self.ads_headers()?;
        let transport = &self.transport;

        (|| async {
            transport.limiter.until_ready().await;
            let (access_token, _) = self.token.access_token(&transport.http).await?;

            let request = match body {
                Some(body) => transport.http.post(url.clone()).json(body),
                None => transport.http.get(url.clone()),
            };
            let resp = request
                .bearer_auth(access_token)
                .headers(headers.clone())
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(classify_upstream_error(resp).await);
            }

            let bytes = resp.bytes().await?;
            Ok(serde_json::from_slice::<T>(&bytes)?)
        })
        .retry(transport.retry_policy)
        .when(|err: &AdpulseError| err.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(
                customer_id = %self.creds.customer_id,
                "[GoogleAds] Upstream error {} retry after {:?}",
                err,
                dur
            );
        })
        .await
    }

    /// Run a GAQL query and collect every page.
    async fn search(&self, query: &str) -> Result<Vec<GoogleAdsRow>, AdpulseError> {
        let url = self.endpoint(&format!(
            "customers/{}/googleAds:search",
            self.creds.customer_id
        ))?;

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let request = SearchRequest::new(query).with_page_token(page_token.take());
            let page: SearchResponse = self.send_json(&url, Some(&request)).await?;
            let next = page.next_page().map(str::to_string);
            rows.extend(page.results);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            customer_id = %self.creds.customer_id,
            rows = rows.len(),
            "[GoogleAds] search completed"
        );
        Ok(rows)
    }
}

#[async_trait]
impl AdsPlatform for GoogleAdsClient {
    async fn get_campaigns(&self) -> Result<Vec<LiveCampaign>, AdpulseError> {
        let rows = self.search(CAMPAIGNS_QUERY).await?;
        Ok(rows.into_iter().filter_map(campaign_from_row).collect())
    }

    async fn get_metrics(
        &self,
        campaign_ids: &[String],
        range: &DateRange,
    ) -> Result<Vec<LiveDailyMetrics>, AdpulseError> {
        let query = metrics_query(campaign_ids, range)?;
        let rows = self.search(&query).await?;
        Ok(rows.into_iter().filter_map(metrics_from_row).collect())
    }

    async fn test_connection(&self) -> Result<ConnectionCheck, AdpulseError> {
        let url = self.endpoint("customers:listAccessibleCustomers")?;
        let listing: ListAccessibleCustomersResponse =
            self.send_json::<_, ()>(&url, None).await?;
        let accessible_customer_ids = listing.customer_ids();

        // Listing only proves the token works; the probe proves this customer is readable.
        self.search(CUSTOMER_PROBE_QUERY).await?;

        let customer_accessible = accessible_customer_ids.iter().any(|id| {
            *id == self.creds.customer_id
                || self.creds.login_customer_id.as_deref() == Some(id.as_str())
        });
        let (_, token_expiry) = self.token.access_token(&self.transport.http).await?;

        Ok(ConnectionCheck {
            accessible_customer_ids,
            customer_accessible,
            token_expiry: Some(token_expiry),
        })
    }
}
