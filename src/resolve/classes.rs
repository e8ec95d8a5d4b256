//! Semantic class resolution
//!
//! Maps an object uri to the `x-maemo-nepomuk/<class>` pseudo-mimes that
//! describe it, most specific first. Querying the object store is left to
//! the [`SnippetMatcher`] collaborator.

use std::collections::HashMap;

use crate::config::{bind_conditions, DeviceInfo, RawConfig, TrackerCondition};
use crate::core::types::{tracker_mime, TRACKER_PREFIX};

pub trait ClassResolver: Send + Sync {
    /// Pseudo-mimes of `uri`, most specific first. Unknown uris yield none.
    fn classes_of(&self, uri: &str) -> Vec<String>;
}

/// Knows no classes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClasses;

impl ClassResolver for NoClasses {
    fn classes_of(&self, _uri: &str) -> Vec<String> {
        Vec::new()
    }
}

/// A fixed uri to classes table
#[derive(Debug, Clone, Default)]
pub struct StaticClasses {
    table: HashMap<String, Vec<String>>,
}

impl StaticClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `uri`. Class names without the pseudo-mime prefix get it.
    pub fn with_classes<I, S>(mut self, uri: impl Into<String>, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes = classes
            .into_iter()
            .map(|class| {
                let class = class.as_ref();
                if class.starts_with(TRACKER_PREFIX) {
                    class.to_string()
                } else {
                    tracker_mime(class)
                }
            })
            .collect();
        self.table.insert(uri.into(), classes);
        self
    }
}

impl ClassResolver for StaticClasses {
    fn classes_of(&self, uri: &str) -> Vec<String> {
        self.table.get(uri).cloned().unwrap_or_default()
    }
}

/// Decides whether an object satisfies a condition snippet
pub trait SnippetMatcher: Send + Sync {
    fn matches(&self, uri: &str, snippet: &str) -> bool;
}

impl<F> SnippetMatcher for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn matches(&self, uri: &str, snippet: &str) -> bool {
        self(uri, snippet)
    }
}

/// Classes from the configured tracker conditions, in configuration order
pub struct ConditionClassifier<M> {
    conditions: Vec<TrackerCondition>,
    matcher: M,
}

impl<M: SnippetMatcher> ConditionClassifier<M> {
    pub fn new(conditions: Vec<TrackerCondition>, matcher: M) -> Self {
        Self {
            conditions,
            matcher,
        }
    }

    /// Conditions of `config` with the device placeholders bound
    pub fn from_config(config: &RawConfig, device: &dyn DeviceInfo, matcher: M) -> Self {
        Self::new(bind_conditions(config, device), matcher)
    }

    pub fn conditions(&self) -> &[TrackerCondition] {
        &self.conditions
    }
}

impl<M: SnippetMatcher> ClassResolver for ConditionClassifier<M> {
    fn classes_of(&self, uri: &str) -> Vec<String> {
        self.conditions
            .iter()
            .filter(|condition| self.matcher.matches(uri, &condition.snippet))
            .map(|condition| tracker_mime(&condition.name))
            .collect()
    }
}
