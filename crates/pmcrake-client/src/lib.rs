//! pmcrake-client: rate-limited NCBI access and batch orchestration.
//!
//! Everything network-facing lives here: the token-bucket limiter, the
//! email/API-key pool, retry/backoff, the Entrez and ID-converter clients,
//! auxiliary service wrappers (BioC, OA, OAI-PMH, citation export), local
//! XML access, and the concurrent batch orchestrator that drives the
//! `pmcrake-core` transformation per item.

pub mod batch;
pub mod cancel;
pub mod config;
pub mod credentials;
pub mod entrez;
pub mod error;
pub mod http;
pub mod idconvert;
pub mod limiter;
pub mod local;
pub mod retry;
pub mod services;

pub use batch::{
    BatchItem, BatchOptions, BatchProcessor, BatchReport, BatchSummary, ConsoleProgress,
    DiscardProgress, ItemOutcome, ItemStatus, OutputFormat, ProgressEvent, ProgressSink,
};
pub use cancel::CancelFlag;
pub use config::Settings;
pub use credentials::CredentialPool;
pub use entrez::EntrezClient;
pub use error::{ClientError, ErrorKind, Result};
pub use http::RateLimitedClient;
pub use idconvert::IdConverter;
pub use limiter::RateLimiter;
pub use retry::{ItemState, RetryPolicy};
