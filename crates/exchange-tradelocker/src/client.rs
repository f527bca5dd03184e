use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Well-known API hosts, selected by the `--env` flag.
pub const LIVE_API_URL: &str = "https://live.tradelocker.com/backend-api";
pub const DEMO_API_URL: &str = "https://demo.tradelocker.com/backend-api";

/// Low-level request failure. Rate limiting is its own variant so callers
/// can branch on it without sniffing response text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limited by broker API")]
    RateLimited,
    #[error("broker API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct TradeLockerClient {
    http_client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl TradeLockerClient {
    /// Creates a client for the given API base URL.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        // TradeLocker allows roughly 600 requests per minute per account
        let quota = Quota::per_second(NonZeroU32::new(10).ok_or_else(|| {
            anyhow::anyhow!("rate limiter quota must be non-zero")
        })?);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let http_client = Client::builder()
            // bounds a hung broker call so the open worker cannot stall forever
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            rate_limiter,
        })
    }

    async fn check(response: reqwest::Response) -> Result<serde_json::Value, ApiError> {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response.json().await?)
    }

    pub async fn get(
        &self,
        endpoint: &str,
        token: &str,
        acc_num: &str,
    ) -> Result<serde_json::Value, ApiError> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .header("accNum", acc_num)
            .send()
            .await?;
        Self::check(response).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        token: &str,
        acc_num: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .header("accNum", acc_num)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        token: &str,
        acc_num: &str,
    ) -> Result<serde_json::Value, ApiError> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(token)
            .header("accNum", acc_num)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Unauthenticated POST, used only for the login exchange.
    pub async fn post_anonymous(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http_client.post(&url).json(&body).send().await?;
        Self::check(response).await
    }
}
