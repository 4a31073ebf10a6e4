//! Runtime settings, 12-factor style: everything overridable through the
//! environment (`EMAILS`, `API_KEY`, `TIMEOUT`, `RETRIES`).

use std::time::Duration;

use crate::error::{ClientError, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone)]
pub struct Settings {
    pub emails: Vec<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            emails: Vec::new(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl Settings {
    /// Read settings from the process environment. Unparseable numeric
    /// values are configuration errors, not silent defaults.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(emails) = std::env::var("EMAILS") {
            settings.emails = emails
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(key) = std::env::var("API_KEY") {
            if !key.trim().is_empty() {
                settings.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(timeout) = std::env::var("TIMEOUT") {
            let secs: u64 = timeout
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("invalid TIMEOUT value: {timeout:?}")))?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Ok(retries) = std::env::var("RETRIES") {
            let attempts: u32 = retries
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("invalid RETRIES value: {retries:?}")))?;
            settings.retries = attempts.max(1);
        }

        Ok(settings)
    }
}
