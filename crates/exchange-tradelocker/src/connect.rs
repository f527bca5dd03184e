use crate::client::{ApiError, TradeLockerClient};
use crate::session::TradeLockerSession;
use order_relay_core::BrokerConfig;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Login credentials, as passed on the command line.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub server: String,
}

/// Tagged login outcome. Only `RateLimited` is retryable; everything else
/// aborts startup for the strategy that needed the session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("broker rate-limited the login attempt")]
    RateLimited,
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error("transport error during login: {0}")]
    Transport(String),
}

impl From<ApiError> for ConnectError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited => Self::RateLimited,
            ApiError::Status { status, body } => Self::Rejected(format!("{status}: {body}")),
            ApiError::Transport(e) => Self::Transport(e.to_string()),
        }
    }
}

/// Bounded retry policy for rate-limited logins. Backoff grows linearly
/// with the attempt number.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn from_config(config: &BrokerConfig) -> Self {
        Self {
            max_attempts: config.login_max_attempts,
            base_backoff: Duration::from_secs(config.login_backoff_secs),
        }
    }

    #[must_use]
    pub const fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.base_backoff.as_secs() * attempt as u64)
    }
}

/// Runs `op` until it succeeds, retrying only on `RateLimited` with the
/// policy's backoff, up to the attempt ceiling.
///
/// # Errors
/// Returns the final [`ConnectError`] once the ceiling is reached, or the
/// first non-rate-limit failure immediately.
pub async fn retry_rate_limited<T, F, Fut>(
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, ConnectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ConnectError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(ConnectError::RateLimited) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    tracing::error!(attempt, "login rate-limited, attempt ceiling reached");
                    return Err(ConnectError::RateLimited);
                }
                let delay = policy.backoff_for(attempt);
                tracing::warn!(attempt, delay_secs = delay.as_secs(), "login rate-limited, backing off");
                tokio::time::sleep(delay).await;
            }
            Err(other) => return Err(other),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Performs one login exchange against `/auth/jwt/token`.
///
/// # Errors
/// Returns a [`ConnectError`] tagged by outcome; a 429 from the broker maps
/// to `RateLimited` without inspecting any message text.
pub async fn login(
    client: &TradeLockerClient,
    credentials: &Credentials,
) -> Result<String, ConnectError> {
    let body = json!({
        "email": credentials.email,
        "password": credentials.password,
        "server": credentials.server,
    });
    let response = client.post_anonymous("/auth/jwt/token", body).await?;
    let token: TokenResponse = serde_json::from_value(response)
        .map_err(|e| ConnectError::Rejected(format!("malformed token response: {e}")))?;
    Ok(token.access_token)
}

/// Builds an authenticated session, retrying rate-limited logins per the
/// broker config.
///
/// # Errors
/// Returns an error once the retry ceiling is exhausted or on any
/// non-rate-limit login failure.
pub async fn connect_with_retry(
    credentials: &Credentials,
    config: &BrokerConfig,
    api_url: String,
) -> anyhow::Result<TradeLockerSession> {
    let client = TradeLockerClient::new(api_url)?;
    let policy = RetryPolicy::from_config(config);
    let token = retry_rate_limited(policy, || login(&client, credentials)).await?;
    tracing::info!(server = %credentials.server, account = %config.account_id, "broker session established");
    Ok(TradeLockerSession::new(
        client,
        token,
        config.account_id.clone(),
        config.account_num.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn succeeds_after_three_rate_limited_attempts() {
        let calls = AtomicU32::new(0);
        let result = retry_rate_limited(policy(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(ConnectError::RateLimited)
                } else {
                    Ok("token")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "token");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn stops_at_attempt_ceiling() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_rate_limited(policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ConnectError::RateLimited) }
        })
        .await;
        assert!(matches!(result, Err(ConnectError::RateLimited)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_rate_limit_failure_is_immediate() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_rate_limited(policy(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ConnectError::Rejected("bad password".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(ConnectError::Rejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_grows_linearly() {
        let p = RetryPolicy {
            max_attempts: 5,
            base_backoff: Duration::from_secs(2),
        };
        assert_eq!(p.backoff_for(1), Duration::from_secs(2));
        assert_eq!(p.backoff_for(2), Duration::from_secs(4));
        assert_eq!(p.backoff_for(3), Duration::from_secs(6));
    }
}
