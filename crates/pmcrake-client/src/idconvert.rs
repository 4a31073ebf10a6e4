//! NCBI PMC ID Converter client: PMID / DOI -> PMCID.
//!
//! Bare decimal strings normalize as PMCIDs, so callers that know they hold
//! PMIDs must say so by passing typed [`AnyId`] values; the string-based
//! batch entry point applies the id-file auto-detection rule instead.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;

use pmcrake_core::{AnyId, Pmcid};

use crate::cancel::CancelFlag;
use crate::credentials::CredentialPool;
use crate::error::{ClientError, Result};
use crate::http::RateLimitedClient;
use crate::retry::{with_retry, RetryPolicy};

const IDCONV_URL: &str = "https://pmc.ncbi.nlm.nih.gov/tools/idconv/v1.0/json/";

#[derive(Debug, Clone)]
pub struct IdConverter {
    http: RateLimitedClient,
    pool: Arc<CredentialPool>,
    policy: RetryPolicy,
    base_url: String,
}

impl IdConverter {
    pub fn new(http: RateLimitedClient, pool: Arc<CredentialPool>, policy: RetryPolicy) -> Self {
        Self {
            http,
            pool,
            policy,
            base_url: IDCONV_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve one identifier. PMCIDs never touch the network.
    pub async fn convert(&self, id: &AnyId, cancel: &CancelFlag) -> Result<Pmcid> {
        let mut results = self.convert_ids(std::slice::from_ref(id), cancel).await?;
        results
            .pop()
            .unwrap_or_else(|| Err(ClientError::NotFound(query_key(id))))
    }

    /// Resolve a batch of typed identifiers. Inputs are deduplicated into a
    /// single converter request; output order matches input order, one
    /// result per requested identifier.
    #[instrument(skip_all, fields(n = ids.len()))]
    pub async fn convert_ids(
        &self,
        ids: &[AnyId],
        cancel: &CancelFlag,
    ) -> Result<Vec<Result<Pmcid>>> {
        let mut to_query: IndexSet<String> = IndexSet::new();
        for id in ids {
            if !matches!(id, AnyId::Pmcid(_)) {
                to_query.insert(query_key(id));
            }
        }

        let mapping = if to_query.is_empty() {
            HashMap::new()
        } else {
            self.lookup(&to_query, cancel).await?
        };

        Ok(ids
            .iter()
            .map(|id| match id {
                AnyId::Pmcid(pmcid) => Ok(pmcid.clone()),
                other => mapping
                    .get(&query_key(other))
                    .cloned()
                    .ok_or_else(|| ClientError::NotFound(query_key(other))),
            })
            .collect())
    }

    /// Resolve free-form strings with id-file auto-detection: `PMC`-prefixed
    /// or bare-decimal tokens are PMCIDs, `10.*` tokens are DOIs.
    pub async fn convert_batch(
        &self,
        inputs: &[String],
        cancel: &CancelFlag,
    ) -> Result<Vec<Result<Pmcid>>> {
        let classified: Vec<Result<AnyId>> = inputs
            .iter()
            .map(|input| AnyId::classify(input).map_err(ClientError::from))
            .collect();

        let valid: Vec<AnyId> = classified
            .iter()
            .filter_map(|c| c.as_ref().ok().cloned())
            .collect();
        let mut resolved = self.convert_ids(&valid, cancel).await?.into_iter();

        Ok(classified
            .into_iter()
            .map(|c| match c {
                Ok(_) => resolved
                    .next()
                    .unwrap_or_else(|| Err(ClientError::Config("converter misalignment".into()))),
                Err(err) => Err(err),
            })
            .collect())
    }

    /// One converter request for the deduplicated id set, retried per the
    /// shared policy, yielding a query-key -> PMCID map.
    async fn lookup(
        &self,
        ids: &IndexSet<String>,
        cancel: &CancelFlag,
    ) -> Result<HashMap<String, Pmcid>> {
        let joined = ids.iter().cloned().collect::<Vec<_>>().join(",");
        let mut query = vec![
            ("ids", joined),
            ("format", "json".to_string()),
            ("email", self.pool.next_email()),
        ];
        if let Some(key) = self.pool.api_key() {
            query.push(("api_key", key.to_string()));
        }

        let (body, _attempts) = with_retry(&self.policy, cancel, |_| {
            let query = query.clone();
            async move { self.http.get_text(&self.base_url, &query, cancel).await }
        })
        .await;
        let body = body?;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("id converter response: {e}")))?;

        let mut mapping = HashMap::new();
        if let Some(records) = value["records"].as_array() {
            for record in records {
                let Some(pmcid) = record["pmcid"]
                    .as_str()
                    .filter(|s| !s.is_empty())
                    .and_then(|s| Pmcid::parse(s).ok())
                else {
                    continue;
                };
                for field in ["pmid", "doi", "requested-id"] {
                    if let Some(key) = record[field].as_str().filter(|s| !s.is_empty()) {
                        mapping.insert(key.to_lowercase(), pmcid.clone());
                    }
                }
            }
        }
        Ok(mapping)
    }
}

fn query_key(id: &AnyId) -> String {
    match id {
        AnyId::Pmcid(p) => p.prefixed().to_lowercase(),
        AnyId::Pmid(p) => p.as_str().to_string(),
        AnyId::Doi(d) => d.normalized.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::RateLimiter;
    use mockito::Matcher;
    use pmcrake_core::{Doi, Pmid};
    use std::time::Duration;

    fn converter(base: String) -> IdConverter {
        let pool = Arc::new(CredentialPool::new(vec!["t@test.org".into()], None));
        let http = RateLimitedClient::new(Arc::new(RateLimiter::new(100)), Duration::from_secs(5))
            .unwrap();
        IdConverter::new(http, pool, RetryPolicy::with_attempts(1)).with_base_url(base)
    }

    #[tokio::test]
    async fn pmcid_inputs_skip_the_network() {
        // Unreachable base URL: any request would fail the test.
        let converter = converter("http://localhost:1/idconv".to_string());
        let id = AnyId::Pmcid(Pmcid::parse("PMC7181753").unwrap());
        let pmcid = converter.convert(&id, &CancelFlag::new()).await.unwrap();
        assert_eq!(pmcid.as_str(), "7181753");
    }

    #[tokio::test]
    async fn pmid_and_doi_resolve_through_the_service() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/idconv")
            .match_query(Matcher::UrlEncoded(
                "ids".into(),
                "33087749,10.1038/s41586-020-2832-5".into(),
            ))
            .with_status(200)
            .with_body(
                r#"{"status":"ok","records":[
                    {"pmcid":"PMC7181753","pmid":"33087749","doi":"10.1038/s41586-020-2832-5"}
                ]}"#,
            )
            .create_async()
            .await;

        let converter = converter(format!("{}/idconv", server.url()));
        let ids = [
            AnyId::Pmid(Pmid::parse("33087749").unwrap()),
            AnyId::Doi(Doi::parse("10.1038/s41586-020-2832-5").unwrap()),
        ];
        let results = converter.convert_ids(&ids, &CancelFlag::new()).await.unwrap();
        assert_eq!(results[0].as_ref().unwrap().as_str(), "7181753");
        assert_eq!(results[1].as_ref().unwrap().as_str(), "7181753");
    }

    #[tokio::test]
    async fn unmapped_id_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/idconv")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"ok","records":[{"pmid":"1","live":"false"}]}"#)
            .create_async()
            .await;

        let converter = converter(format!("{}/idconv", server.url()));
        let id = AnyId::Doi(Doi::parse("10.1000/gone.404").unwrap());
        let err = converter.convert(&id, &CancelFlag::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_inputs_issue_one_lookup_preserving_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/idconv")
            .match_query(Matcher::UrlEncoded("ids".into(), "33087749".into()))
            .with_status(200)
            .with_body(r#"{"records":[{"pmcid":"PMC7181753","pmid":"33087749"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let converter = converter(format!("{}/idconv", server.url()));
        let pmid = AnyId::Pmid(Pmid::parse("33087749").unwrap());
        let ids = [
            pmid.clone(),
            pmid,
            AnyId::Pmcid(Pmcid::parse("PMC3539614").unwrap()),
        ];
        let results = converter.convert_ids(&ids, &CancelFlag::new()).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().as_str(), "7181753");
        assert_eq!(results[1].as_ref().unwrap().as_str(), "7181753");
        assert_eq!(results[2].as_ref().unwrap().as_str(), "3539614");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn string_batch_rejects_garbage_inline() {
        let converter = converter("http://localhost:1/idconv".to_string());
        let results = converter
            .convert_batch(
                &["PMC7181753".to_string(), "not an id".to_string()],
                &CancelFlag::new(),
            )
            .await
            .unwrap();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ClientError::UnsupportedInput(_))
        ));
    }
}
