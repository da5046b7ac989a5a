//! Rate-limit errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Invalid value {value:?} for header {header}")]
    InvalidHeaderValue { header: String, value: String },
}

pub type Result<T> = std::result::Result<T, RateLimitError>;
