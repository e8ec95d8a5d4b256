//! Specialization ordering of highlight rules
//!
//! Turns the unordered `name -> regexp` and `name -> parent` tables into a
//! list where every rule precedes the rule it specializes. Matching scans
//! that list front to back, so a specific rule always gets the first
//! chance at a piece of text.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::warn;

use super::error::ConfigError;
use super::reader::RawConfig;
use crate::core::types::highlight_mime;

/// A compiled highlight rule
#[derive(Debug, Clone)]
pub struct HighlightRule {
    /// `x-maemo-highlight/<name>`
    pub mime: String,
    pub pattern: Regex,
}

impl HighlightRule {
    pub fn new(mime: impl Into<String>, pattern: Regex) -> Self {
        Self {
            mime: mime.into(),
            pattern,
        }
    }
}

/// Order rule names specific-before-general.
///
/// Repeatedly takes the first unplaced name, climbs `parents` while the
/// parent is still unplaced, and prepends the name where the climb stopped.
/// A climb that reaches a name it already visited is a specialization loop:
/// it is reported and the climb stops there, so every name is emitted once.
pub fn specialization_order(
    rules: &BTreeMap<String, String>,
    parents: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut unplaced: BTreeSet<&str> = rules.keys().map(String::as_str).collect();
    let mut ordered = VecDeque::with_capacity(rules.len());

    while let Some(start) = unplaced.first().copied() {
        let mut current = start;
        let mut visited = HashSet::from([start]);

        while let Some(parent) = parents.get(current).map(String::as_str) {
            if !unplaced.contains(parent) {
                break;
            }
            if !visited.insert(parent) {
                warn!("Loop in regexp specialization: {}", parent);
                break;
            }
            current = parent;
        }

        unplaced.remove(current);
        ordered.push_front(current.to_string());
    }

    ordered.into()
}

/// Compile the configured highlight rules in specialization order.
///
/// Rules with an invalid regexp are skipped with a warning.
pub fn compile_rules(config: &RawConfig) -> Vec<HighlightRule> {
    specialization_order(&config.highlights, &config.parents)
        .into_iter()
        .filter_map(|name| {
            let source = config.highlights.get(&name)?;
            match Regex::new(source) {
                Ok(pattern) => Some(HighlightRule::new(highlight_mime(&name), pattern)),
                Err(source) => {
                    warn!("{}", ConfigError::InvalidRegex { name, source });
                    None
                }
            }
        })
        .collect()
}
