//! Invocation error types

use thiserror::Error;

/// Result type for invocation operations
pub type InvocationResult<T> = std::result::Result<T, InvocationError>;

#[derive(Error, Debug)]
pub enum InvocationError {
    /// The entry declares an `interface.method` without a usable dot
    #[error("Invalid interface.method declaration '{value}' in {entry}")]
    InvalidMethod { entry: String, value: String },

    #[error("Cannot trigger an invalid action")]
    InvalidAction,

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },

    #[error("Bus call {target} failed: {reason}")]
    Bus { target: String, reason: String },

    #[error("No implementor for interface {interface}")]
    NoImplementor { interface: String },
}
