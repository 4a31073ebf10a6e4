//! Thin clients for the auxiliary NCBI services. All of them share the
//! process-wide rate limiter and retry policy through the common
//! [`crate::http::RateLimitedClient`].

pub mod bioc;
pub mod citexport;
pub mod oa;
pub mod oai;

pub use bioc::BiocClient;
pub use citexport::{CitationExportClient, CitationFormat};
pub use oa::{OaClient, OaIdType};
pub use oai::{Harvest, OaiClient, OaiHeader, OaiRecord, OaiSet};
