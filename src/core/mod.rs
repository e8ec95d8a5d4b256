//! content-action core module
//!
//! This module contains the pieces every other module builds on:
//! - Runtime settings
//! - Error types and handling
//! - Content keys and pseudo-mime helpers

pub mod config;
pub mod error;
pub mod types;


// Re-export commonly used items
pub use config::*;
pub use error::{ContentActionError, Result, SettingsError};
pub use types::ContentKey;
