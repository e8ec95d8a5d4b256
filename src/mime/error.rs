//! Application index error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for application index operations
pub type MimeResult<T> = std::result::Result<T, MimeError>;

#[derive(Error, Debug)]
pub enum MimeError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid content type: '{0}'")]
    InvalidContentType(String),

    #[error("Invalid application id: '{0}'")]
    InvalidAppId(String),
}
