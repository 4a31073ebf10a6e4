//! Literature Citation Exporter client: formatted citations for PMC
//! articles (MEDLINE, RIS, BibTeX, NBIB, PubMed).

use pmcrake_core::Pmcid;

use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::http::RateLimitedClient;
use crate::retry::{with_retry, RetryPolicy};

const CITEXPORT_URL: &str = "https://api.ncbi.nlm.nih.gov/lit/ctxp/v1/pmc/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationFormat {
    Medline,
    Ris,
    Bibtex,
    Nbib,
    Pubmed,
}

impl CitationFormat {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Medline => "medline",
            Self::Ris => "ris",
            Self::Bibtex => "bibtex",
            Self::Nbib => "nbib",
            Self::Pubmed => "pubmed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CitationExportClient {
    http: RateLimitedClient,
    policy: RetryPolicy,
    base_url: String,
}

impl CitationExportClient {
    pub fn new(http: RateLimitedClient, policy: RetryPolicy) -> Self {
        Self {
            http,
            policy,
            base_url: CITEXPORT_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn export(
        &self,
        pmcid: &Pmcid,
        format: CitationFormat,
        cancel: &CancelFlag,
    ) -> Result<String> {
        let query = vec![
            ("format", format.as_param().to_string()),
            ("id", pmcid.prefixed()),
        ];
        let (body, _attempts) = with_retry(&self.policy, cancel, |_| {
            let query = query.clone();
            async move { self.http.get_text(&self.base_url, &query, cancel).await }
        })
        .await;
        body
    }
}
