//! XML action configuration reader
//!
//! A configuration directory holds any number of `*.xml` documents of the
//! form:
//!
//! ```xml
//! <actions>
//!   <highlight name="url" regexp="https?://\S+"/>
//!   <highlight name="youtube" regexp="https?://www\.youtube\.com/\S+" specialCaseOf="url"/>
//!   <tracker-condition name="own-device">{ ?uri nfo:device "@MODEL@" }</tracker-condition>
//! </actions>
//! ```
//!
//! Files are read in name order. A file that fails to parse contributes
//! nothing; the others are still merged.

use glob::Pattern;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use super::error::{ConfigError, ConfigResult};

/// A named semantic-store condition snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerCondition {
    pub name: String,
    pub snippet: String,
}

/// Parsed, unordered action configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfig {
    /// Short rule name -> regexp source
    pub highlights: BTreeMap<String, String>,
    /// Short rule name -> short name of the rule it specializes
    pub parents: BTreeMap<String, String>,
    /// Condition snippets in declaration order
    pub conditions: Vec<TrackerCondition>,
}

impl RawConfig {
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.conditions.is_empty()
    }

    /// Merge `other` into `self`. Later declarations replace earlier ones
    /// with the same name; a replaced condition keeps its position.
    pub fn merge(&mut self, other: RawConfig) {
        for (name, regexp) in other.highlights {
            self.parents.remove(&name);
            self.highlights.insert(name, regexp);
        }
        self.parents.extend(other.parents);
        for condition in other.conditions {
            match self.conditions.iter_mut().find(|c| c.name == condition.name) {
                Some(existing) => existing.snippet = condition.snippet,
                None => self.conditions.push(condition),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Limbo,
    Actions,
    Highlight,
    Condition,
    Done,
}

/// Read every `*.xml` file of `dir`.
///
/// Never fails: an unreadable directory yields an empty configuration and
/// broken files are skipped, each with a warning.
pub fn parse_config_dir(dir: &Path) -> RawConfig {
    let mut config = RawConfig::default();

    let files = match config_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("{}", e);
            return config;
        }
    };

    for file in files {
        match parse_config_file(&file) {
            Ok(parsed) => {
                debug!(
                    file = %file.display(),
                    highlights = parsed.highlights.len(),
                    conditions = parsed.conditions.len(),
                    "Loaded action configuration"
                );
                config.merge(parsed);
            }
            Err(e) => warn!("Skipping {}: {}", file.display(), e),
        }
    }

    config
}

fn config_files(dir: &Path) -> ConfigResult<Vec<std::path::PathBuf>> {
    let matcher = Pattern::new("*.xml").map_err(|e| ConfigError::Xml {
        origin: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::UnreadableDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| matcher.matches(name))
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Parse a single configuration file
pub fn parse_config_file(path: &Path) -> ConfigResult<RawConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&content, &path.display().to_string())
}

/// Parse one configuration document. `origin` only labels errors.
pub fn parse_config_str(xml: &str, origin: &str) -> ConfigResult<RawConfig> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut config = RawConfig::default();
    let mut state = State::Limbo;
    let mut condition_name = String::new();
    let mut snippet = String::new();

    let xml_error = |e: quick_xml::Error| ConfigError::Xml {
        origin: origin.to_string(),
        reason: e.to_string(),
    };

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let tag = tag_name(e);
                state = match state {
                    State::Limbo => {
                        if tag != "actions" {
                            return Err(ConfigError::UnexpectedRoot {
                                origin: origin.to_string(),
                                expected: "actions",
                                found: tag,
                            });
                        }
                        if is_empty {
                            State::Done
                        } else {
                            State::Actions
                        }
                    }
                    State::Actions if tag == "highlight" => {
                        read_highlight(e, origin, &mut config)?;
                        if is_empty {
                            State::Actions
                        } else {
                            State::Highlight
                        }
                    }
                    State::Actions if tag == "tracker-condition" => {
                        condition_name = required_attribute(e, "tracker-condition", "name", origin)?
                            .trim()
                            .to_string();
                        snippet.clear();
                        if is_empty {
                            push_condition(&mut config, &condition_name, &snippet);
                            State::Actions
                        } else {
                            State::Condition
                        }
                    }
                    _ => {
                        return Err(ConfigError::UnexpectedTag {
                            origin: origin.to_string(),
                            tag,
                        })
                    }
                };
            }
            Event::Text(ref t) if state == State::Condition => {
                snippet.push_str(&t.unescape().map_err(xml_error)?);
            }
            Event::CData(t) if state == State::Condition => {
                snippet.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(_) => {
                state = match state {
                    State::Actions => State::Done,
                    State::Highlight => State::Actions,
                    State::Condition => {
                        push_condition(&mut config, &condition_name, &snippet);
                        State::Actions
                    }
                    other => other,
                };
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if state == State::Limbo {
        return Err(ConfigError::Xml {
            origin: origin.to_string(),
            reason: "document has no <actions> element".to_string(),
        });
    }

    Ok(config)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn read_highlight(e: &BytesStart<'_>, origin: &str, config: &mut RawConfig) -> ConfigResult<()> {
    let regexp = required_attribute(e, "highlight", "regexp", origin)?;
    let name = required_attribute(e, "highlight", "name", origin)?
        .trim()
        .to_string();
    if name.is_empty() {
        return Err(ConfigError::EmptyAttribute {
            origin: origin.to_string(),
            tag: "highlight",
            attribute: "name",
        });
    }

    let parent = optional_attribute(e, "specialCaseOf", origin)?
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    config.highlights.insert(name.clone(), regexp);
    match parent {
        Some(parent) => {
            config.parents.insert(name, parent);
        }
        None => {
            config.parents.remove(&name);
        }
    }
    Ok(())
}

fn push_condition(config: &mut RawConfig, name: &str, snippet: &str) {
    config.merge(RawConfig {
        conditions: vec![TrackerCondition {
            name: name.to_string(),
            snippet: snippet.trim().to_string(),
        }],
        ..RawConfig::default()
    });
}

fn optional_attribute(
    e: &BytesStart<'_>,
    attribute: &str,
    origin: &str,
) -> ConfigResult<Option<String>> {
    let attr_error = |reason: String| ConfigError::Xml {
        origin: origin.to_string(),
        reason,
    };

    match e
        .try_get_attribute(attribute)
        .map_err(|err| attr_error(err.to_string()))?
    {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|err| attr_error(err.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn required_attribute(
    e: &BytesStart<'_>,
    tag: &'static str,
    attribute: &'static str,
    origin: &str,
) -> ConfigResult<String> {
    optional_attribute(e, attribute, origin)?
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::EmptyAttribute {
            origin: origin.to_string(),
            tag,
            attribute,
        })
}
