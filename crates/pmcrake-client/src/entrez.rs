//! NCBI Entrez efetch client for full-text PMC XML.

use std::sync::Arc;

use tracing::instrument;

use pmcrake_core::Pmcid;

use crate::cancel::CancelFlag;
use crate::credentials::CredentialPool;
use crate::error::{ClientError, Result};
use crate::http::RateLimitedClient;

const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

#[derive(Debug, Clone)]
pub struct EntrezClient {
    http: RateLimitedClient,
    pool: Arc<CredentialPool>,
    base_url: String,
}

impl EntrezClient {
    pub fn new(http: RateLimitedClient, pool: Arc<CredentialPool>) -> Self {
        Self {
            http,
            pool,
            base_url: EFETCH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One fetch attempt for the article's full XML. An empty or
    /// error-marked body means the archive has no record for the ID.
    #[instrument(skip(self, cancel), fields(pmcid = %pmcid))]
    pub async fn fetch_article(&self, pmcid: &Pmcid, cancel: &CancelFlag) -> Result<String> {
        let mut query = vec![
            ("db", "pmc".to_string()),
            ("id", pmcid.as_str().to_string()),
            ("rettype", "full".to_string()),
            ("retmode", "xml".to_string()),
            ("email", self.pool.next_email()),
        ];
        if let Some(key) = self.pool.api_key() {
            query.push(("api_key", key.to_string()));
        }

        let body = self.http.get_text(&self.base_url, &query, cancel).await?;
        if body.trim().is_empty() {
            return Err(ClientError::NotFound(format!("PMC{pmcid}: empty response")));
        }
        if body.contains("<ERROR") || body.contains("<error>") {
            return Err(ClientError::NotFound(format!(
                "PMC{pmcid}: error response from efetch"
            )));
        }
        Ok(body)
    }
}
