use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// A DOI, normalized to its lowercase bare form (`10.<registrant>/<suffix>`).
/// Resolver-URL and `doi:` prefixes are stripped on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Doi {
    pub raw: String,
    pub normalized: String,
}

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let stripped = if let Some(s) = input.strip_prefix("https://doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("http://doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("https://dx.doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("http://dx.doi.org/") {
            s
        } else if let Some(s) = input.strip_prefix("doi:") {
            s.trim_start()
        } else if let Some(s) = input.strip_prefix("DOI:") {
            s.trim_start()
        } else {
            input
        };

        if !stripped.starts_with("10.") {
            return Err(CoreError::UnsupportedInput(input.to_string()));
        }
        let slash = stripped
            .find('/')
            .ok_or_else(|| CoreError::UnsupportedInput(input.to_string()))?;
        if stripped[slash + 1..].is_empty() {
            return Err(CoreError::UnsupportedInput(input.to_string()));
        }

        Ok(Self {
            raw: input.to_string(),
            normalized: stripped.to_lowercase(),
        })
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}
