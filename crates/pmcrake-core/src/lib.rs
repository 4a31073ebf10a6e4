//! pmcrake-core: JATS XML to structured-document transformation.
//!
//! The pipeline: bytes -> [`xml::parse_article`] -> cleaned tree ->
//! extractors -> [`Document`] -> serialized artifact. Everything here is
//! synchronous and deterministic; fetching and batch orchestration live in
//! `pmcrake-client`.

pub mod assemble;
pub mod document;
pub mod error;
pub mod extract;
pub mod identifiers;
pub mod serialize;
pub mod xml;

pub use assemble::{assemble_document, document_from_xml};
pub use document::{Citation, Contributor, Document, Equation, Figure, Paragraph, Table};
pub use error::{CoreError, Result};
pub use identifiers::{AnyId, Doi, Pmcid, Pmid};
