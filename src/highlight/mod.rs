//! Text highlighting
//!
//! Finds the parts of a text that some highlight rule recognizes. Two scans
//! are offered:
//! - [`Highlighter::find_highlights`]: specific rules claim text first and
//!   the result never overlaps
//! - [`Highlighter::highlight`]: every match of every rule, overlaps allowed

mod matcher;

pub use matcher::{Highlighter, Match, RuleMatch, Span};
