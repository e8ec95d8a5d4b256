//! Application index for content-action
//!
//! Provides:
//! - The merged `mimeinfo.cache` registry, rescanned at most once per
//!   refresh interval and re-parsed only on modification time changes
//! - The `defaults.list` store with a writable user layer
//! - [`AppIndex`]: candidate and default applications per content type
//! - Content type detection for local files

mod cache;
mod defaults;
mod detect;
mod error;
mod index;
#[cfg(test)]
mod tests;

pub use cache::{parse_section, Associations, MimeInfoCache, MIME_CACHE_FILE, MIME_CACHE_SECTION};
pub use defaults::{DefaultsStore, DEFAULTS_FILE, DEFAULTS_SECTION};
pub use detect::{ExtensionDetector, MimeDetector, DIRECTORY_MIME, UNKNOWN_MIME};
pub use error::{MimeError, MimeResult};
pub use index::AppIndex;
