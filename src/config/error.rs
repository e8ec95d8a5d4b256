//! Action configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised while reading the XML action configuration.
///
/// None of these abort loading: the offending file or rule is skipped with
/// a warning and the rest of the configuration is used.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read actions from {path}: {source}")]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {origin}: {reason}")]
    Xml { origin: String, reason: String },

    #[error("{origin}: expected tag <{expected}>, found <{found}>")]
    UnexpectedRoot {
        origin: String,
        expected: &'static str,
        found: String,
    },

    #[error("{origin}: unexpected tag <{tag}>")]
    UnexpectedTag { origin: String, tag: String },

    #[error("{origin}: <{tag}> needs a nonempty {attribute}")]
    EmptyAttribute {
        origin: String,
        tag: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid regexp for {name}: {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },
}
