//! Subscan-compatible explorer client
//!
//! Implements [`HistorySourceClient`] over the explorer's JSON API:
//! one `POST` per page with `{address, row, page}`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use super::client::{HistorySourceClient, RawPage};
use crate::config::{HistoryConfig, DEFAULT_REQUESTS_PER_SECOND};
use crate::error::{HistoryError, HistoryResult};
use crate::types::*;
use crate::utils::{EndpointConfig, RateLimiter};
use crate::log_debug;

const MODULE: &str = "history::subscan";

lazy_static::lazy_static! {
    /// Request budget shared by every client in the process, keyed by
    /// explorer `host:port`
    static ref EXPLORER_LIMITS: Mutex<RateLimiter> = Mutex::new(RateLimiter::new(
        EndpointConfig::per_second(DEFAULT_REQUESTS_PER_SECOND)
    ));
}

/// Endpoint path for each source, relative to the explorer base URL
pub fn source_path(label: SourceLabel) -> &'static str {
    match label {
        SourceLabel::Transfers => "api/scan/transfers",
        SourceLabel::Rewards => "api/scan/account/reward_slash",
        SourceLabel::Extrinsics => "api/scan/extrinsics",
    }
}

pub struct SubscanClient {
    http: reqwest::Client,
    base_url: Url,
    host: String,
    api_key: Option<String>,
    throttle_wait: Duration,
}

impl SubscanClient {
    pub fn from_config(config: &HistoryConfig) -> HistoryResult<Self> {
        let base_url = config.validate()?;
        let host = format!(
            "{}:{}",
            base_url.host_str().unwrap_or_default(),
            base_url.port_or_known_default().unwrap_or_default()
        );

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent("wallet-history/0.1")
            .build()
            .map_err(|e| HistoryError::network_error(format!("Failed to create HTTP client: {}", e)))?;

        // One page request dispatches up to three calls at once.
        EXPLORER_LIMITS
            .lock()
            .map_err(|_| HistoryError::internal("Rate limiter lock poisoned"))?
            .ensure_endpoint(
                &host,
                EndpointConfig {
                    burst: config.requests_per_second.max(SourceLabel::all().len() as u32),
                    ..EndpointConfig::per_second(config.requests_per_second)
                },
            );

        Ok(Self {
            http,
            base_url,
            host,
            api_key: config.api_key.clone(),
            throttle_wait: config.throttle_wait(),
        })
    }

    pub fn endpoint(&self, label: SourceLabel) -> HistoryResult<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(source_path(label))?)
    }

    /// Take one request from the process-wide budget for this explorer
    fn try_acquire(&self) -> HistoryResult<Result<(), Duration>> {
        let mut limiter = EXPLORER_LIMITS
            .lock()
            .map_err(|_| HistoryError::internal("Rate limiter lock poisoned"))?;
        Ok(limiter.try_acquire(&self.host))
    }

    /// Wait out client-side throttling for at most `throttle_wait`
    async fn throttle(&self) -> HistoryResult<()> {
        let mut waited = Duration::ZERO;
        while let Err(wait) = self.try_acquire()? {
            if waited + wait > self.throttle_wait {
                return Err(HistoryError::rate_limited(format!(
                    "Rate limit exceeded for {}",
                    self.host
                )));
            }
            log_debug!(MODULE, "Throttling explorer request", wait_ms = wait.as_millis());
            tokio::time::sleep(wait).await;
            waited += wait;
        }
        Ok(())
    }

    async fn post<T: DeserializeOwned>(
        &self,
        label: SourceLabel,
        request: &PageRequest<'_>,
    ) -> HistoryResult<Option<T>> {
        self.throttle().await?;

        let url = self.endpoint(label)?;
        log_debug!(
            MODULE,
            "Fetching source page",
            source = label,
            address = request.address,
            row = request.row,
            page = request.page,
        );

        let mut builder = self.http.post(url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("X-API-Key", key);
        }

        let response = builder.send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HistoryError::rate_limited("Explorer rate limited the request"));
        }
        let response = response.error_for_status()?;

        let body = response.text().await?;
        parse_envelope(&body)
    }
}

#[async_trait]
impl HistorySourceClient for SubscanClient {
    async fn fetch_page(
        &self,
        label: SourceLabel,
        address: &str,
        row: u32,
        page: u32,
    ) -> HistoryResult<RawPage> {
        let request = PageRequest { address, row, page };

        let result = match label {
            SourceLabel::Transfers => self
                .post::<TransfersData>(label, &request)
                .await
                .map(|data| RawPage::Transfers(data.and_then(|d| d.transfers).unwrap_or_default())),
            SourceLabel::Rewards => self
                .post::<RewardsData>(label, &request)
                .await
                .map(|data| RawPage::Rewards(data.and_then(|d| d.list).unwrap_or_default())),
            SourceLabel::Extrinsics => self
                .post::<ExtrinsicsData>(label, &request)
                .await
                .map(|data| RawPage::Extrinsics(data.and_then(|d| d.extrinsics).unwrap_or_default())),
        };

        result.map_err(|e| e.with_source(label))
    }
}

/// Decode the `{code, message, data}` envelope. A non-zero code is a
/// source failure; a missing `data` is an empty page.
pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> HistoryResult<Option<T>> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| HistoryError::parse_error(format!("Failed to parse explorer response: {}", e)))?;

    if envelope.code != 0 {
        return Err(HistoryError::network_error(format!(
            "Explorer returned code {}",
            envelope.code
        ))
        .with_details(envelope.message));
    }

    Ok(envelope.data)
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct PageRequest<'a> {
    address: &'a str,
    row: u32,
    page: u32,
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct TransfersData {
    transfers: Option<Vec<TransferRecord>>,
}

#[derive(Deserialize)]
struct RewardsData {
    list: Option<Vec<RewardRecord>>,
}

#[derive(Deserialize)]
struct ExtrinsicsData {
    extrinsics: Option<Vec<ExtrinsicRecord>>,
}
