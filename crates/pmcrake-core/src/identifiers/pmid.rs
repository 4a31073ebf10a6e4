use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// A PubMed identifier: a non-empty decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pmid(String);

impl Pmid {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::UnsupportedInput(input.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pmid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_decimal() {
        assert_eq!(Pmid::parse("33087749").unwrap().as_str(), "33087749");
    }

    #[test]
    fn rejects_non_decimal() {
        assert!(Pmid::parse("PMC33087749").is_err());
        assert!(Pmid::parse("").is_err());
    }
}
