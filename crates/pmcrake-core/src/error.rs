use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported identifier: {0}")]
    UnsupportedInput(String),

    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("not a JATS article: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
