//! Client for the external market-data provider.
//!
//! The ledger only holds current state. Candles, public trades and the
//! account's history (fills, funding payments, transfers) come from an
//! indexer reachable over HTTP, which answers with the same JSON shapes the
//! gateway serves.
//!
//! # Example
//!
//! ```rust,ignore
//! use zo_gateway::api::{MarketDataClient, RetryConfig};
//! use zo_gateway::shared::{Resolution, TimeRange};
//!
//! let client = MarketDataClient::builder("https://indexer.example")
//!     .timeout_secs(10)
//!     .with_retry(RetryConfig::new(3))
//!     .build()?;
//! let candles = client
//!     .get_candles("SOL-PERP", Resolution::OneHour, TimeRange::default())
//!     .await?;
//! ```

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::api::types::{Candle, Fill, FundingPayment, HistoryQuery, Trade, TransferRecord};
use crate::shared::{Resolution, TimeRange};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum rows per history request.
const MAX_PAGINATION_LIMIT: u32 = 5_000;

/// Retry configuration for the market-data client.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = disabled)
    pub max_retries: u32,
    /// Base delay before first retry (ms)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (ms)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 100,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    pub fn with_max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Exponential backoff, 75-100% jitter.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp_delay = self.base_delay_ms.saturating_mul(1 << attempt.min(10));
        let capped = exp_delay.min(self.max_delay_ms);
        let jitter_range = capped / 4;
        let jitter = rand::random::<u64>() % (jitter_range + 1);
        Duration::from_millis(capped - jitter_range + jitter)
    }
}

/// Builder for [`MarketDataClient`].
#[derive(Debug, Clone)]
pub struct MarketDataClientBuilder {
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    retry_config: RetryConfig,
}

impl MarketDataClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: Vec::new(),
            retry_config: RetryConfig::default(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Add a header sent with every request (e.g. an API key).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn build(self) -> ApiResult<MarketDataClient> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        for (name, value) in self.default_headers {
            let header_name = reqwest::header::HeaderName::try_from(name.as_str())
                .map_err(|e| ApiError::InvalidParameter(format!("Invalid header name '{}': {}", name, e)))?;
            let header_value = reqwest::header::HeaderValue::from_str(&value)
                .map_err(|e| ApiError::InvalidParameter(format!("Invalid header value for '{}': {}", name, e)))?;
            headers.insert(header_name, header_value);
        }

        let http_client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(10)
            .default_headers(headers)
            .build()?;

        Ok(MarketDataClient {
            http_client,
            base_url: self.base_url,
            retry_config: self.retry_config,
        })
    }
}

/// Market-data provider client.
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    http_client: Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl MarketDataClient {
    /// Client with default settings (30s timeout, no retries).
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        MarketDataClientBuilder::new(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> MarketDataClientBuilder {
        MarketDataClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    async fn get<T: DeserializeOwned, Q: Serialize>(&self, path: &str, query: &Q) -> ApiResult<T> {
        let query = serde_urlencoded::to_string(query)
            .map_err(|e| ApiError::InvalidParameter(e.to_string()))?;
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };
        self.execute_with_retry(|| self.http_client.get(&url).send()).await
    }

    async fn execute_with_retry<T, F, Fut>(&self, request_fn: F) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: DeserializeOwned,
    {
        let mut attempt = 0;

        loop {
            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response.json::<T>().await.map_err(|e| {
                            ApiError::Deserialize(format!("Failed to deserialize response: {}", e))
                        });
                    }

                    let error = Self::parse_error_response(response).await;

                    if attempt < self.retry_config.max_retries && Self::is_retryable_status(status) {
                        let delay = self.retry_config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max_retries = self.retry_config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            status = %status,
                            "Retrying market-data request after error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(error);
                }
                Err(e) => {
                    let is_retryable = e.is_connect() || e.is_timeout() || e.is_request();

                    if attempt < self.retry_config.max_retries && is_retryable {
                        let delay = self.retry_config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max_retries = self.retry_config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Retrying market-data request after network error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(ApiError::Http(e));
                }
            }
        }
    }

    async fn parse_error_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read error response body");
                return Self::map_status_error(status, format!("HTTP {} (body unreadable)", status));
            }
        };
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .unwrap_or_else(|_| ErrorResponse::from_text(body))
            .get_message();
        Self::map_status_error(status, message)
    }

    fn map_status_error(status: StatusCode, message: String) -> ApiError {
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST => ApiError::BadRequest(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(message),
            _ if status.is_server_error() => ApiError::ServerError(message),
            _ => ApiError::UnexpectedStatus(status.as_u16(), message),
        }
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    fn validate_range(range: &TimeRange) -> ApiResult<()> {
        range.validate().map_err(ApiError::InvalidParameter)
    }

    fn validate_history(query: &HistoryQuery) -> ApiResult<()> {
        Self::validate_range(&TimeRange {
            start_time: query.start_time,
            end_time: query.end_time,
        })?;
        match query.limit {
            Some(limit) if limit == 0 || limit > MAX_PAGINATION_LIMIT => Err(ApiError::InvalidParameter(
                format!("Limit must be 1-{}", MAX_PAGINATION_LIMIT),
            )),
            _ => Ok(()),
        }
    }

    fn validate_account(account: &str) -> ApiResult<()> {
        bs58::decode(account)
            .into_vec()
            .ok()
            .filter(|bytes| bytes.len() == 32)
            .map(|_| ())
            .ok_or_else(|| ApiError::InvalidParameter(format!("{} is not a valid account address", account)))
    }

    // =========================================================================
    // Market endpoints
    // =========================================================================

    /// OHLCV candles of a market.
    pub async fn get_candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        range: TimeRange,
    ) -> ApiResult<Vec<Candle>> {
        Self::validate_range(&range)?;

        #[derive(Serialize)]
        struct Query {
            resolution: u32,
            #[serde(flatten)]
            range: TimeRange,
        }

        let path = format!("/markets/{}/candles", urlencoding::encode(symbol));
        self.get(
            &path,
            &Query {
                resolution: resolution.as_secs(),
                range,
            },
        )
        .await
    }

    /// Public trades of a market, newest first.
    pub async fn get_trades(&self, symbol: &str, query: &HistoryQuery) -> ApiResult<Vec<Trade>> {
        Self::validate_history(query)?;
        let path = format!("/markets/{}/trades", urlencoding::encode(symbol));
        self.get(&path, query).await
    }

    // =========================================================================
    // Account history endpoints
    // =========================================================================

    /// Fills of a margin account.
    pub async fn get_fills(&self, margin_account: &str, query: &HistoryQuery) -> ApiResult<Vec<Fill>> {
        Self::validate_account(margin_account)?;
        Self::validate_history(query)?;
        self.get(&format!("/accounts/{}/fills", margin_account), query).await
    }

    /// Funding payments of a margin account.
    pub async fn get_funding_payments(
        &self,
        margin_account: &str,
        query: &HistoryQuery,
    ) -> ApiResult<Vec<FundingPayment>> {
        Self::validate_account(margin_account)?;
        Self::validate_history(query)?;
        self.get(&format!("/accounts/{}/funding_payments", margin_account), query)
            .await
    }

    /// Deposits and withdrawals of a margin account.
    pub async fn get_transfers(
        &self,
        margin_account: &str,
        query: &HistoryQuery,
    ) -> ApiResult<Vec<TransferRecord>> {
        Self::validate_account(margin_account)?;
        Self::validate_history(query)?;
        self.get(&format!("/accounts/{}/transfers", margin_account), query)
            .await
    }
}
