use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unsupported identifier: {0}")]
    UnsupportedInput(String),

    #[error("no record for {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not a JATS article: {0}")]
    Validation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

/// The closed error-kind set reported in ledgers and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    UnsupportedInput,
    NotFound,
    NetworkError,
    ValidationError,
    ParseError,
    IOFailed,
    Cancelled,
    ConfigError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnsupportedInput => "UnsupportedInput",
            Self::NotFound => "NotFound",
            Self::NetworkError => "NetworkError",
            Self::ValidationError => "ValidationError",
            Self::ParseError => "ParseError",
            Self::IOFailed => "IOFailed",
            Self::Cancelled => "Cancelled",
            Self::ConfigError => "ConfigError",
        };
        f.write_str(name)
    }
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Network(_) | Self::Http(_) => ErrorKind::NetworkError,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::Io { .. } => ErrorKind::IOFailed,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::ConfigError,
        }
    }

    /// Transport failures, 429/5xx, and parser errors on a body we did
    /// receive are worth another attempt. Everything else is final for the
    /// item.
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NetworkError | ErrorKind::ParseError)
    }

    /// Errors that should stop the whole batch, not just one item.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self.kind(), ErrorKind::ConfigError)
    }
}

impl From<pmcrake_core::CoreError> for ClientError {
    fn from(err: pmcrake_core::CoreError) -> Self {
        match err {
            pmcrake_core::CoreError::UnsupportedInput(s) => Self::UnsupportedInput(s),
            pmcrake_core::CoreError::Parse(s) => Self::Parse(s),
            pmcrake_core::CoreError::Validation(s) => Self::Validation(s),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
