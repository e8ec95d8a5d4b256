//! Logging configuration types

use serde::{Deserialize, Serialize};

/// Log verbosity level, most verbose first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive spelling
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Level selected by repeated `-v` flags, starting from warn
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// How diagnostics are filtered and rendered on stderr
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level applied to every target without its own directive
    pub level: LogLevel,

    pub format: LogFormat,

    /// Extra `target=level` directives, e.g. `content_action::mime=debug`
    pub directives: Vec<String>,

    /// `RUST_LOG` replaces the filter above when set
    pub honor_env: bool,

    /// Print the module path of each event
    pub show_target: bool,

    /// Print source file and line of each event
    pub show_location: bool,

    /// Colored text output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Text,
            directives: Vec::new(),
            honor_env: true,
            show_target: true,
            show_location: false,
            ansi: false,
        }
    }
}

impl LoggingConfig {
    /// Debug output for this crate only, with source locations
    pub fn development() -> Self {
        Self {
            level: LogLevel::Warn,
            directives: vec![format!("content_action={}", LogLevel::Debug)],
            show_location: true,
            ansi: true,
            ..Self::default()
        }
    }

    /// Configuration used by `lca-tool`: warnings only unless `-v` is given
    pub fn cli(verbosity: u8) -> Self {
        Self {
            level: LogLevel::from_verbosity(verbosity),
            show_target: verbosity > 1,
            ..Self::default()
        }
    }
}
