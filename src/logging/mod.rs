//! Logging System for content-action
//!
//! Structured diagnostics through `tracing`. Configuration problems and
//! trigger failures are reported as warnings, cache refreshes and
//! resolution traces at debug level. Everything is written to stderr so
//! that `lca-tool` output on stdout stays machine readable.

mod config;

#[cfg(test)]
mod tests;

pub use config::{LogFormat, LogLevel, LoggingConfig};

use thiserror::Error;
use tracing_subscriber::{
    filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot install the log subscriber: {0}")]
    Install(String),

    #[error("Invalid filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Handle on the installed subscriber
#[derive(Debug)]
pub struct LoggingSystem {
    level: LogLevel,
}

impl LoggingSystem {
    /// Initialize the logging system with the given configuration
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let env_filter = Self::build_env_filter(&config)?;
        let stderr_layer = Self::stderr_layer(&config);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|e| LoggingError::Install(e.to_string()))?;

        Ok(Self {
            level: config.level,
        })
    }

    /// `RUST_LOG` when allowed and set, else the configured level plus
    /// directives
    pub(crate) fn build_env_filter(config: &LoggingConfig) -> LoggingResult<EnvFilter> {
        if config.honor_env {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }

        config
            .directives
            .iter()
            .try_fold(EnvFilter::new(config.level.as_str()), |filter, directive| {
                let parsed = directive.parse::<Directive>().map_err(|e| {
                    LoggingError::InvalidDirective {
                        directive: directive.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(filter.add_directive(parsed))
            })
    }

    /// Stderr layer in the configured format
    fn stderr_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_file(config.show_location)
            .with_line_number(config.show_location);

        if config.format == LogFormat::Json {
            layer.json().boxed()
        } else {
            layer.with_ansi(config.ansi).boxed()
        }
    }

    /// Global level the subscriber was installed with
    pub fn level(&self) -> LogLevel {
        self.level
    }
}
