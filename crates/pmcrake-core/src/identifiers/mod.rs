//! Typed article identifiers: PMCID, PMID, DOI.

mod doi;
mod pmcid;
mod pmid;

pub use doi::Doi;
pub use pmcid::Pmcid;
pub use pmid::Pmid;

use crate::error::{CoreError, Result};

/// One identifier of any supported kind, as classified from free-form input.
///
/// Bare decimal strings are ambiguous between PMIDs and unprefixed PMCIDs;
/// callers pick the interpretation that fits their input mode. The id-file
/// auto-detection treats them as PMCIDs, matching the fetch pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyId {
    Pmcid(Pmcid),
    Pmid(Pmid),
    Doi(Doi),
}

impl AnyId {
    pub fn classify(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::UnsupportedInput(input.to_string()));
        }
        if let Ok(doi) = Doi::parse(trimmed) {
            return Ok(Self::Doi(doi));
        }
        if trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("pmc") {
            return Ok(Self::Pmcid(Pmcid::parse(trimmed)?));
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Self::Pmcid(Pmcid::parse(trimmed)?));
        }
        Err(CoreError::UnsupportedInput(input.to_string()))
    }
}
