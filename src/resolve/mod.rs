//! Action resolution
//!
//! Provides:
//! - [`ContentActions`]: the context answering "what can be done with this"
//!   for files, uris, strings, semantic objects and content types
//! - Semantic class resolvers for tracker uris

mod classes;
mod engine;

pub use classes::{ClassResolver, ConditionClassifier, NoClasses, SnippetMatcher, StaticClasses};
pub use engine::{file_uri, ContentActions};
