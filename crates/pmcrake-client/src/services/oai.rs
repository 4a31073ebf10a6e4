//! PMC OAI-PMH harvesting client.
//!
//! The List* verbs return lazy streams that follow resumption tokens page
//! by page; only the current page is ever held in memory, so harvests of
//! millions of records run in constant space.

use futures::stream::{self, Stream, TryStreamExt};

use pmcrake_core::xml::{parse, Element};

use crate::cancel::CancelFlag;
use crate::error::{ClientError, Result};
use crate::http::RateLimitedClient;
use crate::retry::{with_retry, RetryPolicy};

const OAI_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/oai/oai.cgi";

#[derive(Debug, Clone)]
pub struct OaiRecord {
    pub identifier: String,
    pub datestamp: String,
    pub sets: Vec<String>,
    /// The metadata payload in the requested format, if present.
    pub metadata: Option<Element>,
}

#[derive(Debug, Clone)]
pub struct OaiHeader {
    pub identifier: String,
    pub datestamp: String,
    pub sets: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OaiSet {
    pub spec: String,
    pub name: String,
}

/// Selective-harvest parameters for the List* verbs.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub metadata_prefix: String,
    pub from: Option<String>,
    pub until: Option<String>,
    pub set: Option<String>,
}

impl Default for Harvest {
    fn default() -> Self {
        Self {
            metadata_prefix: "pmc".to_string(),
            from: None,
            until: None,
            set: None,
        }
    }
}

impl Harvest {
    fn params(&self, verb: &'static str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("verb", verb.to_string()),
            ("metadataPrefix", self.metadata_prefix.clone()),
        ];
        if let Some(from) = &self.from {
            params.push(("from", from.clone()));
        }
        if let Some(until) = &self.until {
            params.push(("until", until.clone()));
        }
        if let Some(set) = &self.set {
            params.push(("set", set.clone()));
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct OaiClient {
    http: RateLimitedClient,
    policy: RetryPolicy,
    base_url: String,
}

impl OaiClient {
    pub fn new(http: RateLimitedClient, policy: RetryPolicy) -> Self {
        Self {
            http,
            policy,
            base_url: OAI_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn get_record(
        &self,
        identifier: &str,
        metadata_prefix: &str,
        cancel: &CancelFlag,
    ) -> Result<OaiRecord> {
        let params = vec![
            ("verb", "GetRecord".to_string()),
            ("identifier", identifier.to_string()),
            ("metadataPrefix", metadata_prefix.to_string()),
        ];
        let root = self.request(params, cancel).await?;
        root.find("record")
            .map(parse_record)
            .ok_or_else(|| ClientError::NotFound(identifier.to_string()))
    }

    /// Full records, streamed across resumption-token pages.
    pub fn list_records<'a>(
        &'a self,
        harvest: Harvest,
        cancel: CancelFlag,
    ) -> impl Stream<Item = Result<OaiRecord>> + 'a {
        self.paged(
            harvest.params("ListRecords"),
            "ListRecords",
            "record",
            parse_record,
            cancel,
        )
    }

    /// Headers only: the lightweight harvest.
    pub fn list_identifiers<'a>(
        &'a self,
        harvest: Harvest,
        cancel: CancelFlag,
    ) -> impl Stream<Item = Result<OaiHeader>> + 'a {
        self.paged(
            harvest.params("ListIdentifiers"),
            "ListIdentifiers",
            "header",
            parse_header_element,
            cancel,
        )
    }

    pub fn list_sets<'a>(
        &'a self,
        cancel: CancelFlag,
    ) -> impl Stream<Item = Result<OaiSet>> + 'a {
        self.paged(
            vec![("verb", "ListSets".to_string())],
            "ListSets",
            "set",
            parse_set,
            cancel,
        )
    }

    fn paged<'a, T: 'a>(
        &'a self,
        initial: Vec<(&'static str, String)>,
        container: &'static str,
        item: &'static str,
        parse_item: fn(&Element) -> T,
        cancel: CancelFlag,
    ) -> impl Stream<Item = Result<T>> + 'a {
        stream::try_unfold(Some(initial), move |state| {
            let cancel = cancel.clone();
            async move {
                let Some(params) = state else {
                    return Ok(None);
                };
                cancel.check()?;
                let root = match self.request(params, &cancel).await {
                    Ok(root) => root,
                    // An empty harvest (noRecordsMatch) ends the stream
                    // rather than erroring it.
                    Err(ClientError::NotFound(_)) => return Ok(None),
                    Err(err) => return Err(err),
                };

                let items: Vec<T> = root
                    .find(container)
                    .map(|c| c.children_named(item).map(parse_item).collect())
                    .unwrap_or_default();

                let next = root
                    .find("resumptionToken")
                    .map(|t| t.collapsed_text())
                    .filter(|t| !t.is_empty())
                    .map(|token| {
                        vec![
                            ("verb", verb_of(container).to_string()),
                            ("resumptionToken", token),
                        ]
                    });

                Ok(Some((stream::iter(items.into_iter().map(Ok)), next)))
            }
        })
        .try_flatten()
    }

    async fn request(
        &self,
        params: Vec<(&'static str, String)>,
        cancel: &CancelFlag,
    ) -> Result<Element> {
        let (body, _attempts) = with_retry(&self.policy, cancel, |_| {
            let params = params.clone();
            async move { self.http.get_text(&self.base_url, &params, cancel).await }
        })
        .await;
        let body = body?;

        let root = parse(body.as_bytes())
            .map_err(|e| ClientError::Parse(format!("OAI-PMH response: {e}")))?;
        if let Some(error) = root.find("error") {
            let code = error.attr("code").unwrap_or("unknown");
            let message = error.collapsed_text();
            return match code {
                "idDoesNotExist" | "noRecordsMatch" => {
                    Err(ClientError::NotFound(format!("{code}: {message}")))
                }
                _ => Err(ClientError::Validation(format!("{code}: {message}"))),
            };
        }
        Ok(root)
    }
}

fn verb_of(container: &str) -> &'static str {
    match container {
        "ListRecords" => "ListRecords",
        "ListIdentifiers" => "ListIdentifiers",
        _ => "ListSets",
    }
}

fn parse_record(record: &Element) -> OaiRecord {
    let header = record
        .child("header")
        .map(parse_header_element)
        .unwrap_or_else(|| OaiHeader {
            identifier: String::new(),
            datestamp: String::new(),
            sets: Vec::new(),
        });
    OaiRecord {
        identifier: header.identifier,
        datestamp: header.datestamp,
        sets: header.sets,
        metadata: record
            .child("metadata")
            .and_then(|m| m.child_elements().next().cloned()),
    }
}

fn parse_header_element(header: &Element) -> OaiHeader {
    OaiHeader {
        identifier: header.child_text("identifier").unwrap_or_default(),
        datestamp: header.child_text("datestamp").unwrap_or_default(),
        sets: header
            .children_named("setSpec")
            .map(|s| s.collapsed_text())
            .collect(),
    }
}

fn parse_set(set: &Element) -> OaiSet {
    OaiSet {
        spec: set.child_text("setSpec").unwrap_or_default(),
        name: set.child_text("setName").unwrap_or_default(),
    }
}
