//! Rate-limited HTTP plumbing shared by every remote client.
//!
//! One reqwest client per process (connection pooling, gzip, per-request
//! timeout); one token from the shared bucket per request. Each call is a
//! single attempt; retries are layered on top with [`crate::retry::with_retry`]
//! so attempt counts stay visible to the ledger.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cancel::CancelFlag;
use crate::error::{ClientError, Result};
use crate::limiter::RateLimiter;

const USER_AGENT: &str = concat!("pmcrake/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedClient {
    pub fn new(limiter: Arc<RateLimiter>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, limiter })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Single GET attempt: take a token, issue the request, classify the
    /// response status.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        cancel: &CancelFlag,
    ) -> Result<String> {
        self.limiter.acquire(cancel).await?;
        debug!(url, "GET");
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ClientError::Network(format!("HTTP 429 from {url}")));
        }
        if status.is_server_error() {
            return Err(ClientError::Network(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }
        if status.is_client_error() {
            return Err(ClientError::NotFound(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }

        response.text().await.map_err(ClientError::Http)
    }
}
