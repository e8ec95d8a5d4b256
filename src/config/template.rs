//! Device identity substitution in condition snippets
//!
//! Condition snippets may mention `@MANUFACTURER@` and `@MODEL@`; both are
//! replaced with what a [`DeviceInfo`] provider reports before a snippet is
//! handed to the semantic store.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::reader::{RawConfig, TrackerCondition};

pub const MANUFACTURER_PLACEHOLDER: &str = "@MANUFACTURER@";
pub const MODEL_PLACEHOLDER: &str = "@MODEL@";

/// Source of device identity strings
pub trait DeviceInfo: Send + Sync {
    fn manufacturer(&self) -> Option<String>;
    fn model(&self) -> Option<String>;
}

/// Reads the identity the kernel exposes through DMI
#[derive(Debug, Clone)]
pub struct SystemDeviceInfo {
    root: PathBuf,
}

impl Default for SystemDeviceInfo {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/sys/devices/virtual/dmi/id"),
        }
    }
}

impl SystemDeviceInfo {
    /// Read identity files from a custom directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, file: &str) -> Option<String> {
        read_trimmed(&self.root.join(file))
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(value) => Some(value.trim().to_string()).filter(|v| !v.is_empty()),
        Err(e) => {
            debug!("No device identity at {}: {}", path.display(), e);
            None
        }
    }
}

impl DeviceInfo for SystemDeviceInfo {
    fn manufacturer(&self) -> Option<String> {
        self.read("sys_vendor")
    }

    fn model(&self) -> Option<String> {
        self.read("product_name")
    }
}

/// Fixed identity, for tests and embedders that know better
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticDeviceInfo {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

impl StaticDeviceInfo {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: Some(manufacturer.into()),
            model: Some(model.into()),
        }
    }
}

impl DeviceInfo for StaticDeviceInfo {
    fn manufacturer(&self) -> Option<String> {
        self.manufacturer.clone()
    }

    fn model(&self) -> Option<String> {
        self.model.clone()
    }
}

/// Replace the identity placeholders in `snippet`. Unknown values become
/// empty strings.
pub fn substitute(snippet: &str, device: &dyn DeviceInfo) -> String {
    let mut result = snippet.to_string();
    if result.contains(MANUFACTURER_PLACEHOLDER) {
        let manufacturer = device.manufacturer().unwrap_or_default();
        result = result.replace(MANUFACTURER_PLACEHOLDER, &manufacturer);
    }
    if result.contains(MODEL_PLACEHOLDER) {
        let model = device.model().unwrap_or_default();
        result = result.replace(MODEL_PLACEHOLDER, &model);
    }
    result
}

/// The configured conditions with placeholders substituted
pub fn bind_conditions(config: &RawConfig, device: &dyn DeviceInfo) -> Vec<TrackerCondition> {
    config
        .conditions
        .iter()
        .map(|condition| TrackerCondition {
            name: condition.name.clone(),
            snippet: substitute(&condition.snippet, device),
        })
        .collect()
}
