//! PMC Open Access Web Service lookup: availability and download links.

use indexmap::IndexMap;

use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::http::RateLimitedClient;
use crate::retry::{with_retry, RetryPolicy};

const OA_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/utils/oa/oa.fcgi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OaIdType {
    Pmcid,
    Pmid,
    Doi,
}

impl OaIdType {
    fn as_param(self) -> &'static str {
        match self {
            Self::Pmcid => "id",
            Self::Pmid => "pmid",
            Self::Doi => "doi",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OaClient {
    http: RateLimitedClient,
    policy: RetryPolicy,
    base_url: String,
}

impl OaClient {
    pub fn new(http: RateLimitedClient, policy: RetryPolicy) -> Self {
        Self {
            http,
            policy,
            base_url: OA_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the OA record for an article: record attributes plus one entry
    /// per download link (keyed by format). `None` when the service has no
    /// record, which is how it reports non-OA articles.
    pub async fn fetch(
        &self,
        article_id: &str,
        id_type: OaIdType,
        cancel: &CancelFlag,
    ) -> Result<Option<IndexMap<String, String>>> {
        let query = vec![(id_type.as_param(), article_id.to_string())];
        let (body, _attempts) = with_retry(&self.policy, cancel, |_| {
            let query = query.clone();
            async move { self.http.get_text(&self.base_url, &query, cancel).await }
        })
        .await;
        let body = body?;

        let root = pmcrake_core::xml::parse(body.as_bytes())
            .map_err(|e| crate::error::ClientError::Parse(format!("OA response: {e}")))?;
        let Some(record) = root.find("record") else {
            return Ok(None);
        };

        let mut out = IndexMap::new();
        for (key, value) in &record.attrs {
            out.insert(key.clone(), value.clone());
        }
        for link in record.child_elements() {
            let key = link
                .attr("format")
                .unwrap_or(link.local_name())
                .to_string();
            let value = link
                .attr("href")
                .map(str::to_string)
                .unwrap_or_else(|| link.collapsed_text());
            out.insert(key, value);
        }
        Ok(Some(out))
    }
}
