//! BioC RESTful API client. Open Access articles only; non-OA IDs come back
//! as error payloads from the service.

use pmcrake_core::Pmcid;

use crate::cancel::CancelFlag;
use crate::error::{ClientError, Result};
use crate::http::RateLimitedClient;
use crate::retry::{with_retry, RetryPolicy};

const BIOC_URL: &str = "https://www.ncbi.nlm.nih.gov/research/bionlp/RESTful/pmcoa.cgi/BioC_json/";

#[derive(Debug, Clone)]
pub struct BiocClient {
    http: RateLimitedClient,
    policy: RetryPolicy,
    base_url: String,
}

impl BiocClient {
    pub fn new(http: RateLimitedClient, policy: RetryPolicy) -> Self {
        Self {
            http,
            policy,
            base_url: BIOC_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn fetch_json(
        &self,
        pmcid: &Pmcid,
        cancel: &CancelFlag,
    ) -> Result<serde_json::Value> {
        let url = format!("{}{}/unicode", self.base_url, pmcid.prefixed());
        let (body, _attempts) = with_retry(&self.policy, cancel, |_| {
            let url = url.clone();
            async move { self.http.get_text(&url, &[], cancel).await }
        })
        .await;
        let body = body?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("BioC response for {pmcid}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialPool;
    use crate::limiter::RateLimiter;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(base: String) -> BiocClient {
        let pool = CredentialPool::new(Vec::new(), None);
        let http = RateLimitedClient::new(
            Arc::new(RateLimiter::new(pool.rate_limit())),
            Duration::from_secs(5),
        )
        .unwrap();
        BiocClient::new(http, RetryPolicy::with_attempts(1)).with_base_url(base)
    }

    #[tokio::test]
    async fn fetches_and_parses_bioc_json() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/bioc/PMC7181753/unicode")
            .with_status(200)
            .with_body(r#"[{"source":"PMC","documents":[{"id":"7181753","passages":[]}]}]"#)
            .create_async()
            .await;

        let value = client(format!("{}/bioc/", server.url()))
            .fetch_json(&Pmcid::parse("7181753").unwrap(), &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(value[0]["source"], "PMC");
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/bioc/PMC1/unicode")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = client(format!("{}/bioc/", server.url()))
            .fetch_json(&Pmcid::parse("1").unwrap(), &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }
}
