//! Runtime settings for content-action
//!
//! Handles:
//! - Location of the XML action configuration
//! - XDG data directories holding desktop entries, registry caches and defaults
//! - Refresh policy of the application index
//! - Invocation policy (process supervisor, terminal wrapper, entry allow-list)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::SettingsError;

/// Environment variable overriding the action configuration directory
pub const ACTIONS_ENV: &str = "CONTENTACTION_ACTIONS";
/// Environment variable naming a JSON settings file
pub const SETTINGS_ENV: &str = "CONTENTACTION_SETTINGS";
/// Environment variable holding the `:`-separated desktop entry allow-list
pub const ALLOWED_DIRS_ENV: &str = "CONTENTACTION_ALLOWED_DIRS";

const DEFAULT_ACTIONS_DIR: &str = "/usr/share/contentaction";
const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";
const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_SUPERVISOR: &str = "/usr/bin/invoker";

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory scanned for `*.xml` action configuration
    #[serde(default = "default_actions_dir")]
    pub actions_dir: PathBuf,

    /// User data directory (`$XDG_DATA_HOME`)
    #[serde(default = "default_data_home")]
    pub data_home: PathBuf,

    /// System data directories (`$XDG_DATA_DIRS`), in priority order
    #[serde(default = "default_data_dirs")]
    pub data_dirs: Vec<PathBuf>,

    /// Minimum seconds between two scans of the registry caches
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,

    /// Desktop entries outside these directories resolve to the invalid
    /// action. Empty disables the filter.
    #[serde(default = "default_allowed_entry_dirs")]
    pub allowed_entry_dirs: Vec<PathBuf>,

    /// Process supervisor prepended to `Exec` commands
    #[serde(default = "default_supervisor")]
    pub supervisor: Option<String>,

    /// Wrapper used for entries declaring `Terminal=true`
    #[serde(default = "default_terminal_command")]
    pub terminal_command: Vec<String>,

    /// Locale used for localized action names
    #[serde(default = "default_locale")]
    pub locale: Option<String>,

    /// Skip highlight rules whose pseudo-mime has no applications
    #[serde(default)]
    pub highlight_actionable_only: bool,
}

fn default_actions_dir() -> PathBuf {
    std::env::var_os(ACTIONS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ACTIONS_DIR))
}

fn default_data_home() -> PathBuf {
    std::env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from(".local/share"))
}

fn default_data_dirs() -> Vec<PathBuf> {
    let raw = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIRS.to_string());
    split_paths(&raw)
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

fn default_allowed_entry_dirs() -> Vec<PathBuf> {
    std::env::var(ALLOWED_DIRS_ENV)
        .map(|raw| split_paths(&raw))
        .unwrap_or_default()
}

fn default_supervisor() -> Option<String> {
    Some(DEFAULT_SUPERVISOR.to_string())
}

fn default_terminal_command() -> Vec<String> {
    vec!["fingerterm".to_string(), "-e".to_string()]
}

fn default_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
}

fn split_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(':')
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            actions_dir: default_actions_dir(),
            data_home: default_data_home(),
            data_dirs: default_data_dirs(),
            refresh_interval_secs: default_refresh_secs(),
            allowed_entry_dirs: default_allowed_entry_dirs(),
            supervisor: default_supervisor(),
            terminal_command: default_terminal_command(),
            locale: default_locale(),
            highlight_actionable_only: false,
        }
    }
}

impl Settings {
    /// Settings derived from the environment, overlaid with the JSON file
    /// named by `$CONTENTACTION_SETTINGS` when present.
    pub fn from_env() -> Result<Self, SettingsError> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a JSON file. Missing fields keep their
    /// environment-derived defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Settings confined to a single directory tree, ignoring the environment.
    ///
    /// `root/actions` holds the XML configuration, `root/home` is the user
    /// data directory and `root/system` the only system data directory.
    pub fn rooted(root: &Path) -> Self {
        Self {
            actions_dir: root.join("actions"),
            data_home: root.join("home"),
            data_dirs: vec![root.join("system")],
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            allowed_entry_dirs: Vec::new(),
            supervisor: None,
            terminal_command: default_terminal_command(),
            locale: None,
            highlight_actionable_only: false,
        }
    }

    pub fn with_actions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.actions_dir = dir.into();
        self
    }

    pub fn with_data_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_home = dir.into();
        self
    }

    pub fn with_data_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.data_dirs = dirs;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_secs = interval.as_secs();
        self
    }

    pub fn with_allowed_entry_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.allowed_entry_dirs = dirs;
        self
    }

    pub fn with_supervisor(mut self, supervisor: Option<String>) -> Self {
        self.supervisor = supervisor;
        self
    }

    pub fn with_terminal_command(mut self, command: Vec<String>) -> Self {
        self.terminal_command = command;
        self
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_highlight_actionable_only(mut self, enabled: bool) -> Self {
        self.highlight_actionable_only = enabled;
        self
    }

    /// Minimum time between two registry scans
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// All data directories, user directory first
    pub fn all_data_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.data_home.clone())
            .chain(self.data_dirs.iter().cloned())
            .collect()
    }

    /// `applications` subdirectories of every data directory, user first
    pub fn application_dirs(&self) -> Vec<PathBuf> {
        self.all_data_dirs()
            .into_iter()
            .map(|dir| dir.join("applications"))
            .collect()
    }

    /// The defaults file written by `set_mime_default`
    pub fn user_defaults_path(&self) -> PathBuf {
        self.data_home.join("applications").join("defaults.list")
    }

    /// System-wide defaults files, highest priority first
    pub fn system_defaults_paths(&self) -> Vec<PathBuf> {
        self.data_dirs
            .iter()
            .map(|dir| dir.join("applications").join("defaults.list"))
            .collect()
    }
}
