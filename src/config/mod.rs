//! Action configuration for content-action
//!
//! Provides:
//! - Reading the XML configuration directory into plain tables
//! - Specialization ordering and compilation of highlight rules
//! - Device identity substitution in condition snippets
//!
//! Reading is a pure function of the directory contents. Nothing here is
//! cached; the resolution context decides when to load.

mod error;
mod ordering;
mod reader;
mod template;

pub use error::{ConfigError, ConfigResult};
pub use ordering::{compile_rules, specialization_order, HighlightRule};
pub use reader::{parse_config_dir, parse_config_file, parse_config_str, RawConfig, TrackerCondition};
pub use template::{
    bind_conditions, substitute, DeviceInfo, StaticDeviceInfo, SystemDeviceInfo,
    MANUFACTURER_PLACEHOLDER, MODEL_PLACEHOLDER,
};
