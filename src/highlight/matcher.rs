//! Highlight matching over an ordered rule list

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::action::Action;
use crate::config::{compile_rules, HighlightRule, RawConfig};

/// A byte range of the scanned text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        other.start < self.end() && self.start < other.end()
    }

    /// The covered text, if the span lies on character boundaries of `text`
    pub fn text<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end())
    }
}

/// A match of a single rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub span: Span,
    /// Pseudo-mime of the rule that matched
    pub mime: String,
}

/// A match of the overlapping legacy scan, with its resolved actions
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub actions: Vec<Action>,
}

/// The compiled highlight rules, specific before general
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    rules: Vec<HighlightRule>,
    /// Whole-string variants of `rules`, same order
    anchored: Vec<Option<Regex>>,
}

impl Highlighter {
    /// Rules must already be in specialization order
    pub fn new(rules: Vec<HighlightRule>) -> Self {
        let anchored = rules
            .iter()
            .map(|rule| {
                let source = format!(r"\A(?:{})\z", rule.pattern.as_str());
                match Regex::new(&source) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!("Cannot anchor rule {}: {}", rule.mime, e);
                        None
                    }
                }
            })
            .collect();
        Self { rules, anchored }
    }

    pub fn from_config(config: &RawConfig) -> Self {
        let highlighter = Self::new(compile_rules(config));
        debug!("Loaded {} highlight rules", highlighter.rules.len());
        highlighter
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Non-overlapping highlights of `text`, ascending by start
    pub fn find_highlights(&self, text: &str) -> Vec<Span> {
        self.find_highlights_where(text, |_| true)
    }

    /// [`find_highlights`](Self::find_highlights) using only the rules whose
    /// pseudo-mime passes `keep`.
    ///
    /// Each rule is searched only inside the gaps left by earlier rules, so
    /// a match never crosses claimed text.
    pub fn find_highlights_where(&self, text: &str, keep: impl Fn(&str) -> bool) -> Vec<Span> {
        let mut claimed: Vec<Span> = Vec::new();

        for rule in self.rules.iter().filter(|rule| keep(&rule.mime)) {
            let found: Vec<Span> = unclaimed_gaps(&claimed, text.len())
                .into_iter()
                .flat_map(|(start, end)| matches_in_gap(&rule.pattern, text, start, end))
                .collect();
            claimed.extend(found);
            claimed.sort();
        }

        claimed
    }

    /// Highlights starting in `start..end`
    pub fn find_highlights_in(&self, text: &str, start: usize, end: usize) -> Vec<Span> {
        self.find_highlights(text)
            .into_iter()
            .filter(|span| span.start >= start && span.start < end)
            .collect()
    }

    /// The first highlight starting at or after `from`
    pub fn find_next_highlight(&self, text: &str, from: usize) -> Option<Span> {
        self.find_next_highlight_where(text, from, |_| true)
    }

    pub fn find_next_highlight_where(
        &self,
        text: &str,
        from: usize,
        keep: impl Fn(&str) -> bool,
    ) -> Option<Span> {
        self.find_highlights_where(text, keep)
            .into_iter()
            .find(|span| span.start >= from)
    }

    /// Pseudo-mimes of the rules matching the whole of `text`, in rule order
    pub fn mimes_for_string(&self, text: &str) -> Vec<String> {
        self.rules
            .iter()
            .zip(&self.anchored)
            .filter(|(_, anchored)| anchored.as_ref().is_some_and(|re| re.is_match(text)))
            .map(|(rule, _)| rule.mime.clone())
            .collect()
    }

    /// Every match of every rule, without suppression between rules.
    ///
    /// Matches of different rules may overlap. Sorted by start, then end,
    /// then rule order.
    pub fn rule_matches(&self, text: &str) -> Vec<RuleMatch> {
        let mut matches: Vec<(usize, RuleMatch)> = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            for found in rule.pattern.find_iter(text) {
                if found.is_empty() {
                    continue;
                }
                matches.push((
                    index,
                    RuleMatch {
                        span: Span::new(found.start(), found.len()),
                        mime: rule.mime.clone(),
                    },
                ));
            }
        }
        matches.sort_by_key(|(index, m)| (m.span.start, m.span.end(), *index));
        matches.into_iter().map(|(_, m)| m).collect()
    }

    /// Legacy overlapping highlight. `resolve` maps a pseudo-mime and the
    /// matched text to actions; matches without actions are kept.
    pub fn highlight(
        &self,
        text: &str,
        mut resolve: impl FnMut(&str, &str) -> Vec<Action>,
    ) -> Vec<Match> {
        self.rule_matches(text)
            .into_iter()
            .map(|m| {
                let matched = m.span.text(text).unwrap_or_default();
                Match {
                    start: m.span.start,
                    end: m.span.end(),
                    actions: resolve(&m.mime, matched),
                }
            })
            .collect()
    }
}

/// Byte ranges of `0..len` not covered by `claimed` (sorted, disjoint)
fn unclaimed_gaps(claimed: &[Span], len: usize) -> Vec<(usize, usize)> {
    let mut gaps = Vec::with_capacity(claimed.len() + 1);
    let mut from = 0;
    for span in claimed {
        if span.start > from {
            gaps.push((from, span.start));
        }
        from = from.max(span.end());
    }
    if from < len {
        gaps.push((from, len));
    }
    gaps
}

/// Non-empty matches of `pattern` within `start..end` of `text`.
///
/// The haystack is cut at `end`. Text before `start` stays visible to
/// assertions like `\b`.
fn matches_in_gap(pattern: &Regex, text: &str, start: usize, end: usize) -> Vec<Span> {
    let Some(haystack) = text.get(..end) else {
        return Vec::new();
    };
    let mut spans = Vec::new();
    let mut pos = start;
    while pos <= end {
        let Some(found) = pattern.find_at(haystack, pos) else {
            break;
        };
        if found.is_empty() {
            pos = next_boundary(haystack, found.start());
            continue;
        }
        spans.push(Span::new(found.start(), found.len()));
        pos = found.end();
    }
    spans
}

/// The byte index of the character after the one at `index`
fn next_boundary(text: &str, index: usize) -> usize {
    text.get(index..)
        .and_then(|rest| rest.chars().next())
        .map(|c| index + c.len_utf8())
        .unwrap_or(text.len() + 1)
}
