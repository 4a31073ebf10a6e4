//! Concurrent batch orchestrator.
//!
//! Fans the per-item pipeline (fetch -> parse -> assemble -> serialize) out
//! across a bounded worker pool. The ledger keeps one entry per requested
//! input, in input order, whatever order completions arrive in; duplicate
//! identifiers are fetched once and share their outcome.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use pmcrake_core::xml::Element;
use pmcrake_core::{serialize, Document, Pmcid};

use crate::cancel::CancelFlag;
use crate::config::DEFAULT_WORKERS;
use crate::entrez::EntrezClient;
use crate::error::{ClientError, ErrorKind, Result};
use crate::local;
use crate::retry::{with_retry, RetryPolicy};

pub const SUMMARY_FILE: &str = "summary.json";
pub const STREAM_FILE: &str = "articles.jsonl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchItem {
    Pmc(Pmcid),
    File(PathBuf),
}

impl BatchItem {
    /// Stable key used in the ledger and for deduplication.
    pub fn id(&self) -> String {
        match self {
            Self::Pmc(pmcid) => pmcid.prefixed(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    PerItem,
    Stream,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_dir: PathBuf::from("./pmc_output"),
            format: OutputFormat::PerItem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub id: String,
    pub status: ItemStatus,
    pub artifact_path: Option<PathBuf>,
    pub error_kind: Option<ErrorKind>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub id: String,
    pub last_error_kind: ErrorKind,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_requested: usize,
    pub successful: usize,
    pub failed: usize,
    pub error_counts: IndexMap<String, usize>,
    pub elapsed_seconds: f64,
    pub failed_items: Vec<FailedItem>,
}

/// One opaque record per completion, pushed to the caller's sink.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub id: String,
    pub status: ItemStatus,
    pub error_kind: Option<ErrorKind>,
    pub attempts: u32,
    pub completed: usize,
    pub total: usize,
}

pub trait ProgressSink: Send + Sync {
    fn completed(&self, event: &ProgressEvent);
}

/// Logs one line per completion.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn completed(&self, event: &ProgressEvent) {
        match event.status {
            ItemStatus::Success => info!(
                id = %event.id,
                done = event.completed,
                total = event.total,
                "processed"
            ),
            ItemStatus::Failed => warn!(
                id = %event.id,
                kind = ?event.error_kind,
                attempts = event.attempts,
                done = event.completed,
                total = event.total,
                "failed"
            ),
        }
    }
}

pub struct DiscardProgress;

impl ProgressSink for DiscardProgress {
    fn completed(&self, _event: &ProgressEvent) {}
}

#[derive(Debug)]
pub struct BatchReport {
    pub ledger: Vec<ItemOutcome>,
    pub summary: BatchSummary,
    pub summary_path: PathBuf,
}

#[derive(Debug, Clone)]
struct JobResult {
    status: ItemStatus,
    artifact_path: Option<PathBuf>,
    error_kind: Option<ErrorKind>,
    attempts: u32,
    stream_line: Option<String>,
}

pub struct BatchProcessor {
    entrez: EntrezClient,
    policy: RetryPolicy,
    cancel: CancelFlag,
    sink: Arc<dyn ProgressSink>,
}

impl BatchProcessor {
    pub fn new(entrez: EntrezClient, policy: RetryPolicy) -> Self {
        Self {
            entrez,
            policy,
            cancel: CancelFlag::new(),
            sink: Arc::new(DiscardProgress),
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Handle callers can use to cancel the batch from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn run(&self, items: Vec<BatchItem>, options: &BatchOptions) -> Result<BatchReport> {
        let started = Instant::now();

        std::fs::create_dir_all(&options.output_dir).map_err(|source| ClientError::Io {
            path: options.output_dir.clone(),
            source,
        })?;

        // Deduplicate while remembering which job serves each input.
        let keys: Vec<String> = items.iter().map(BatchItem::id).collect();
        let mut job_of: IndexMap<String, usize> = IndexMap::new();
        let mut jobs: Vec<BatchItem> = Vec::new();
        for (key, item) in keys.iter().zip(&items) {
            if !job_of.contains_key(key) {
                job_of.insert(key.clone(), jobs.len());
                jobs.push(item.clone());
            }
        }

        info!(
            requested = items.len(),
            unique = jobs.len(),
            workers = options.workers,
            "starting batch"
        );

        let completed = AtomicUsize::new(0);
        let total = jobs.len();
        let mut results: Vec<(usize, JobResult)> = stream::iter(jobs.iter().enumerate())
            .map(|(idx, item)| {
                let completed = &completed;
                async move {
                    let result = self.process_job(item, options).await;
                    if let Some(kind) = result.error_kind {
                        if kind == ErrorKind::ConfigError {
                            // Fatal for the whole batch: stop admitting work.
                            self.cancel.cancel();
                        }
                    }
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.sink.completed(&ProgressEvent {
                        id: item.id(),
                        status: result.status,
                        error_kind: result.error_kind,
                        attempts: result.attempts,
                        completed: done,
                        total,
                    });
                    (idx, result)
                }
            })
            .buffer_unordered(options.workers.max(1))
            .collect()
            .await;
        results.sort_by_key(|(idx, _)| *idx);
        let mut job_results: Vec<JobResult> = results.into_iter().map(|(_, r)| r).collect();

        if options.format == OutputFormat::Stream {
            self.write_stream_file(&mut job_results, &options.output_dir)?;
        }

        let ledger: Vec<ItemOutcome> = keys
            .iter()
            .map(|key| {
                let job = &job_results[job_of[key]];
                ItemOutcome {
                    id: key.clone(),
                    status: job.status,
                    artifact_path: job.artifact_path.clone(),
                    error_kind: job.error_kind,
                    attempts: job.attempts,
                }
            })
            .collect();

        let summary = summarize(&ledger, started.elapsed().as_secs_f64());
        let summary_path = options.output_dir.join(SUMMARY_FILE);
        std::fs::write(
            &summary_path,
            serde_json::to_string_pretty(&summary)
                .expect("summary serialization is infallible"),
        )
        .map_err(|source| ClientError::Io {
            path: summary_path.clone(),
            source,
        })?;

        info!(
            successful = summary.successful,
            failed = summary.failed,
            elapsed = summary.elapsed_seconds,
            "batch complete"
        );

        Ok(BatchReport {
            ledger,
            summary,
            summary_path,
        })
    }

    async fn process_job(&self, item: &BatchItem, options: &BatchOptions) -> JobResult {
        if self.cancel.is_cancelled() {
            return JobResult {
                status: ItemStatus::Failed,
                artifact_path: None,
                error_kind: Some(ErrorKind::Cancelled),
                attempts: 0,
                stream_line: None,
            };
        }

        let (document, attempts) = match item {
            BatchItem::Pmc(pmcid) => {
                with_retry(&self.policy, &self.cancel, |_| async move {
                    let xml = self.entrez.fetch_article(pmcid, &self.cancel).await?;
                    pmcrake_core::document_from_xml(pmcid, xml.as_bytes())
                        .map_err(ClientError::from)
                })
                .await
            }
            // Local reads get a single attempt: nothing transient about a
            // file that fails to parse.
            BatchItem::File(path) => (local_document(path), 1),
        };

        match document {
            Ok(document) => self.emit(&document, options, attempts),
            Err(err) => {
                warn!(id = %item.id(), attempts, error = %err, "item failed");
                JobResult {
                    status: ItemStatus::Failed,
                    artifact_path: None,
                    error_kind: Some(err.kind()),
                    attempts,
                    stream_line: None,
                }
            }
        }
    }

    fn emit(&self, document: &Document, options: &BatchOptions, attempts: u32) -> JobResult {
        match options.format {
            OutputFormat::PerItem => {
                match serialize::write_per_item(document, &options.output_dir) {
                    Ok(path) => JobResult {
                        status: ItemStatus::Success,
                        artifact_path: Some(path),
                        error_kind: None,
                        attempts,
                        stream_line: None,
                    },
                    Err(source) => JobResult {
                        status: ItemStatus::Failed,
                        artifact_path: None,
                        error_kind: Some(
                            ClientError::Io {
                                path: options.output_dir.clone(),
                                source,
                            }
                            .kind(),
                        ),
                        attempts,
                        stream_line: None,
                    },
                }
            }
            OutputFormat::Stream => JobResult {
                status: ItemStatus::Success,
                artifact_path: None,
                error_kind: None,
                attempts,
                stream_line: Some(serialize::document_to_stream_line(document)),
            },
        }
    }

    /// Stream mode buffers one line per document and writes them here in
    /// job order, so re-runs produce identical files.
    fn write_stream_file(&self, jobs: &mut [JobResult], dir: &Path) -> Result<()> {
        let path = dir.join(STREAM_FILE);
        let mut content = String::new();
        for job in jobs.iter() {
            if let Some(line) = &job.stream_line {
                content.push_str(line);
            }
        }
        std::fs::write(&path, content).map_err(|source| ClientError::Io {
            path: path.clone(),
            source,
        })?;
        for job in jobs.iter_mut() {
            if job.stream_line.take().is_some() {
                job.artifact_path = Some(path.clone());
            }
        }
        Ok(())
    }
}

fn local_document(path: &Path) -> std::result::Result<Document, ClientError> {
    let bytes = local::read_xml(path)?;
    let article = pmcrake_core::xml::parse_article(&bytes)?;
    let pmcid = pmcid_for_local(path, &article);
    Ok(pmcrake_core::assemble_document(&pmcid, &article))
}

/// PMCID for a local file: the file stem when it normalizes, else the
/// article's own id, else zero.
fn pmcid_for_local(path: &Path, article: &Element) -> Pmcid {
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if let Ok(pmcid) = Pmcid::parse(stem) {
            return pmcid;
        }
    }
    for aid in article.find_all("article-id") {
        if matches!(aid.attr("pub-id-type"), Some("pmc") | Some("pmcid")) {
            if let Ok(pmcid) = Pmcid::parse(&aid.collapsed_text()) {
                return pmcid;
            }
        }
    }
    Pmcid::from(0u64)
}

fn summarize(ledger: &[ItemOutcome], elapsed_seconds: f64) -> BatchSummary {
    let mut error_counts: IndexMap<String, usize> = IndexMap::new();
    let mut failed_items = Vec::new();
    let mut successful = 0;

    for outcome in ledger {
        match outcome.status {
            ItemStatus::Success => successful += 1,
            ItemStatus::Failed => {
                let kind = outcome.error_kind.unwrap_or(ErrorKind::NetworkError);
                *error_counts.entry(kind.to_string()).or_insert(0) += 1;
                failed_items.push(FailedItem {
                    id: outcome.id.clone(),
                    last_error_kind: kind,
                    attempts: outcome.attempts,
                });
            }
        }
    }

    BatchSummary {
        total_requested: ledger.len(),
        successful,
        failed: ledger.len() - successful,
        error_counts,
        elapsed_seconds,
        failed_items,
    }
}
