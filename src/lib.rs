//! content-action - find and launch the applications that handle content
//!
//! This crate provides:
//! - Application lookup for files, URI schemes, semantic objects and text
//! - Default application management with a persisted user layer
//! - Regex-based highlighting of actionable text
//! - Triggering applications through exec or session bus invocations

pub mod action;
pub mod config;
pub mod core;
pub mod desktop;
pub mod highlight;
pub mod logging;
pub mod mime;
pub mod resolve;

// Re-export commonly used items
pub use action::{Action, Invocation, InvocationBackend, SystemBackend};
pub use core::error::{ContentActionError, Result};
pub use core::{ContentKey, Settings};
pub use highlight::{Highlighter, Match, Span};
pub use resolve::{ClassResolver, ContentActions};
