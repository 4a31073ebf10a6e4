use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgGroup, Parser, ValueEnum};
use tracing::{error, warn};

use pmcrake_client::{
    BatchItem, BatchOptions, BatchProcessor, BatchReport, CancelFlag, ClientError,
    ConsoleProgress, CredentialPool, DiscardProgress, EntrezClient, ErrorKind, IdConverter,
    OutputFormat, RateLimitedClient, RateLimiter, RetryPolicy, Settings,
};
use pmcrake_core::{AnyId, Doi, Pmcid, Pmid};

// ─── Exit codes ─────────────────────────────────────────────────────────────

const EXIT_OK: u8 = 0;
const EXIT_GENERAL: u8 = 1;
// clap exits with 2 on its own parse failures; unparseable identifier
// values get the same code.
const EXIT_INVALID_ARGS: u8 = 2;
const EXIT_ALL_FETCHES_FAILED: u8 = 3;
const EXIT_OUTPUT_UNWRITABLE: u8 = 4;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pmcrake",
    about = "Batch download & parse PubMed Central articles into structured JSON",
    version,
    long_about = None
)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["pmcids", "pmids", "dois", "id_file", "directory", "files"])
))]
struct Cli {
    /// PMCIDs to fetch; the PMC prefix is optional.
    #[arg(long, num_args = 1..)]
    pmcids: Vec<String>,

    /// PubMed IDs, converted to PMCIDs before processing.
    #[arg(long, num_args = 1..)]
    pmids: Vec<String>,

    /// DOIs, converted to PMCIDs before processing.
    #[arg(long, num_args = 1..)]
    dois: Vec<String>,

    /// Text file with one identifier per line, type auto-detected.
    #[arg(long)]
    id_file: Option<PathBuf>,

    /// Directory of local JATS XML files (*.xml, processed in sorted order).
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Explicit list of local XML paths.
    #[arg(long, num_args = 1..)]
    files: Vec<PathBuf>,

    /// Output directory for artifacts and the summary.
    #[arg(long, default_value = "./pmc_output")]
    output_dir: PathBuf,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = 10)]
    workers: usize,

    /// Artifact layout: one file per article, or one JSON line per article.
    #[arg(long, value_enum, default_value_t = FormatArg::PerItem)]
    format: FormatArg,

    /// Log per-item progress and debug detail.
    #[arg(long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    #[value(name = "per-item")]
    PerItem,
    Stream,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::PerItem => Self::PerItem,
            FormatArg::Stream => Self::Stream,
        }
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    ExitCode::from(run(cli).await)
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> u8 {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!(%err, "invalid configuration");
            return EXIT_GENERAL;
        }
    };

    let pool = Arc::new(CredentialPool::new(
        settings.emails.clone(),
        settings.api_key.clone(),
    ));
    let limiter = Arc::new(RateLimiter::new(pool.rate_limit()));
    let http = match RateLimitedClient::new(Arc::clone(&limiter), settings.timeout) {
        Ok(http) => http,
        Err(err) => {
            error!(%err, "failed to set up HTTP client");
            return EXIT_GENERAL;
        }
    };
    let policy = RetryPolicy::with_attempts(settings.retries);
    let entrez = EntrezClient::new(http.clone(), Arc::clone(&pool));
    let converter = IdConverter::new(http, Arc::clone(&pool), policy.clone());

    // Resolve the selected input mode into batch items.
    let cancel = CancelFlag::new();
    let (items, remote) = match resolve_inputs(&cli, &converter, &cancel).await {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };
    if items.is_empty() {
        error!("no processable inputs remain after identifier resolution");
        return if remote {
            EXIT_ALL_FETCHES_FAILED
        } else {
            EXIT_GENERAL
        };
    }

    let options = BatchOptions {
        workers: cli.workers.max(1),
        output_dir: cli.output_dir.clone(),
        format: cli.format.into(),
    };
    let mut processor = BatchProcessor::new(entrez, policy);
    processor = if cli.quiet {
        processor.with_progress(Arc::new(DiscardProgress))
    } else {
        processor.with_progress(Arc::new(ConsoleProgress))
    };

    let report = match processor.run(items, &options).await {
        Ok(report) => report,
        Err(ClientError::Io { path, source }) => {
            error!(path = %path.display(), %source, "output path is not writable");
            return EXIT_OUTPUT_UNWRITABLE;
        }
        Err(err) => {
            error!(%err, "batch failed");
            return EXIT_GENERAL;
        }
    };

    exit_code_for(&report, remote)
}

// ─── Input resolution ───────────────────────────────────────────────────────

/// Turn the selected input mode into batch items. The bool is true when the
/// batch will hit the network. An error result carries the exit code.
async fn resolve_inputs(
    cli: &Cli,
    converter: &IdConverter,
    cancel: &CancelFlag,
) -> Result<(Vec<BatchItem>, bool), u8> {
    if !cli.pmcids.is_empty() {
        let mut items = Vec::new();
        for raw in &cli.pmcids {
            match Pmcid::parse(raw) {
                Ok(pmcid) => items.push(BatchItem::Pmc(pmcid)),
                Err(err) => {
                    error!(id = %raw, %err, "invalid PMCID");
                    return Err(EXIT_INVALID_ARGS);
                }
            }
        }
        return Ok((items, true));
    }

    if !cli.pmids.is_empty() {
        let ids: Vec<AnyId> = match cli
            .pmids
            .iter()
            .map(|raw| Pmid::parse(raw).map(AnyId::Pmid))
            .collect()
        {
            Ok(ids) => ids,
            Err(err) => {
                error!(%err, "invalid PMID");
                return Err(EXIT_INVALID_ARGS);
            }
        };
        return convert_to_items(converter, &ids, &cli.pmids, cancel).await;
    }

    if !cli.dois.is_empty() {
        let ids: Vec<AnyId> = match cli
            .dois
            .iter()
            .map(|raw| Doi::parse(raw).map(AnyId::Doi))
            .collect()
        {
            Ok(ids) => ids,
            Err(err) => {
                error!(%err, "invalid DOI");
                return Err(EXIT_INVALID_ARGS);
            }
        };
        return convert_to_items(converter, &ids, &cli.dois, cancel).await;
    }

    if let Some(id_file) = &cli.id_file {
        let content = match std::fs::read_to_string(id_file) {
            Ok(content) => content,
            Err(err) => {
                error!(path = %id_file.display(), %err, "cannot read id file");
                return Err(EXIT_GENERAL);
            }
        };
        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        let results = match converter.convert_batch(&lines, cancel).await {
            Ok(results) => results,
            Err(err) => {
                error!(%err, "identifier conversion failed");
                return Err(conversion_exit_code(&err));
            }
        };
        return Ok((collect_converted(&lines, results), true));
    }

    if let Some(directory) = &cli.directory {
        return match pmcrake_client::local::walk_xml_dir(directory) {
            Ok(paths) => Ok((paths.into_iter().map(BatchItem::File).collect(), false)),
            Err(err) => {
                error!(path = %directory.display(), %err, "cannot walk directory");
                Err(EXIT_GENERAL)
            }
        };
    }

    Ok((
        cli.files.iter().cloned().map(BatchItem::File).collect(),
        false,
    ))
}

async fn convert_to_items(
    converter: &IdConverter,
    ids: &[AnyId],
    raw: &[String],
    cancel: &CancelFlag,
) -> Result<(Vec<BatchItem>, bool), u8> {
    let results = match converter.convert_ids(ids, cancel).await {
        Ok(results) => results,
        Err(err) => {
            error!(%err, "identifier conversion failed");
            return Err(conversion_exit_code(&err));
        }
    };
    Ok((collect_converted(raw, results), true))
}

fn collect_converted(
    raw: &[String],
    results: Vec<pmcrake_client::Result<Pmcid>>,
) -> Vec<BatchItem> {
    let mut items = Vec::new();
    for (input, result) in raw.iter().zip(results) {
        match result {
            Ok(pmcid) => items.push(BatchItem::Pmc(pmcid)),
            Err(err) => warn!(id = %input, %err, "skipping identifier without a PMCID"),
        }
    }
    items
}

fn conversion_exit_code(err: &ClientError) -> u8 {
    if err.kind() == ErrorKind::NetworkError {
        EXIT_ALL_FETCHES_FAILED
    } else {
        EXIT_GENERAL
    }
}

fn exit_code_for(report: &BatchReport, remote: bool) -> u8 {
    let summary = &report.summary;
    if summary.failed == 0 {
        return EXIT_OK;
    }
    if summary.successful == 0 && remote {
        return EXIT_ALL_FETCHES_FAILED;
    }
    if summary.successful == 0 {
        return EXIT_GENERAL;
    }
    EXIT_OK
}
