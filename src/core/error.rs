//! Error types for content-action
//!
//! Resolution itself never fails: misses degrade to empty lists or the
//! invalid action. The variants below surface only from explicit I/O
//! (persisting defaults, loading settings, initializing logging).

use thiserror::Error;

use crate::action::InvocationError;
use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::mime::MimeError;

/// Result type alias for content-action operations
pub type Result<T> = std::result::Result<T, ContentActionError>;

/// Main error type for content-action
#[derive(Error, Debug)]
pub enum ContentActionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Application index error: {0}")]
    Mime(#[from] MimeError),

    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading [`Settings`](super::Settings)
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
