use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// A canonical PubMed Central identifier: the bare decimal string with the
/// `PMC` prefix stripped. `"PMC7181753"`, `"pmc7181753"`, `"7181753"` and the
/// integer `7181753` all normalize to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pmcid(String);

impl Pmcid {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = if trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("pmc") {
            &trimmed[3..]
        } else {
            trimmed
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::UnsupportedInput(input.to_string()));
        }
        Ok(Self(digits.to_string()))
    }

    /// Bare numeric form, e.g. `"7181753"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `PMC`-prefixed form used in file names and the `article_id` mapping.
    pub fn prefixed(&self) -> String {
        format!("PMC{}", self.0)
    }
}

impl fmt::Display for Pmcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for Pmcid {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}
