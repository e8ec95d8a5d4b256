//! Core data types for content-action
//!
//! Content keys identify what a piece of content is. Everything the
//! application index understands is expressed as a MIME-like string; the
//! non-file kinds live in pseudo namespaces:
//!
//! - `x-urischeme/<scheme>` for URI schemes
//! - `x-maemo-highlight/<name>` for free-text highlight rules
//! - `x-maemo-nepomuk/<name>` for semantic store classes and conditions

use serde::{Deserialize, Serialize};

/// Namespace of highlight rule pseudo-mimes
pub const HIGHLIGHT_PREFIX: &str = "x-maemo-highlight/";
/// Namespace of semantic class pseudo-mimes
pub const TRACKER_PREFIX: &str = "x-maemo-nepomuk/";
/// Namespace of URI scheme pseudo-mimes
pub const SCHEME_PREFIX: &str = "x-urischeme/";

const PSEUDO_NAMESPACES: [&str; 3] = [HIGHLIGHT_PREFIX, TRACKER_PREFIX, SCHEME_PREFIX];

/// A content-identifying key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContentKey {
    /// A real MIME type such as `image/png`
    FileMime(String),
    /// A URI scheme, stored normalized as `x-urischeme/<scheme>`
    UriScheme(String),
    /// Semantic classes of an object, most specific first
    SemanticClassList(Vec<String>),
    /// A highlight rule pseudo-mime
    TextMatch(String),
}

impl ContentKey {
    pub fn file_mime(mime: impl Into<String>) -> Self {
        ContentKey::FileMime(mime.into())
    }

    /// Build a scheme key; accepts `mailto`, `mailto:` or a full URI
    pub fn uri_scheme(scheme_or_uri: &str) -> Self {
        ContentKey::UriScheme(scheme_mime(scheme_or_uri))
    }

    pub fn semantic_classes(classes: Vec<String>) -> Self {
        ContentKey::SemanticClassList(classes)
    }

    /// Build a text-match key from a rule name or an already prefixed pseudo-mime
    pub fn text_match(name: &str) -> Self {
        if name.starts_with(HIGHLIGHT_PREFIX) {
            ContentKey::TextMatch(name.to_string())
        } else {
            ContentKey::TextMatch(highlight_mime(name))
        }
    }

    /// Content types consulted for this key, in priority order
    pub fn content_types(&self) -> Vec<&str> {
        match self {
            ContentKey::FileMime(m) | ContentKey::UriScheme(m) | ContentKey::TextMatch(m) => {
                vec![m.as_str()]
            }
            ContentKey::SemanticClassList(classes) => {
                classes.iter().map(String::as_str).collect()
            }
        }
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKey::FileMime(m) | ContentKey::UriScheme(m) | ContentKey::TextMatch(m) => {
                write!(f, "{}", m)
            }
            ContentKey::SemanticClassList(classes) => write!(f, "[{}]", classes.join(", ")),
        }
    }
}

/// `x-maemo-highlight/<name>`
pub fn highlight_mime(name: &str) -> String {
    format!("{}{}", HIGHLIGHT_PREFIX, name)
}

/// `x-maemo-nepomuk/<name>`
pub fn tracker_mime(name: &str) -> String {
    format!("{}{}", TRACKER_PREFIX, name)
}

/// `x-urischeme/<scheme>`, lowercased, from a bare scheme or a URI
pub fn scheme_mime(scheme_or_uri: &str) -> String {
    let scheme = scheme_or_uri
        .split_once(':')
        .map(|(scheme, _)| scheme)
        .unwrap_or(scheme_or_uri);
    format!("{}{}", SCHEME_PREFIX, scheme.to_ascii_lowercase())
}

/// Whether a content type lives in one of the pseudo namespaces
pub fn is_pseudo_mime(content_type: &str) -> bool {
    PSEUDO_NAMESPACES
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
}

/// The `type/*` generalization of a content type.
///
/// Pseudo namespaces, wildcards and strings without a slash have none.
pub fn generalize(content_type: &str) -> Option<String> {
    if is_pseudo_mime(content_type) {
        return None;
    }
    let (major, minor) = content_type.split_once('/')?;
    if major.is_empty() || minor.is_empty() || minor == "*" {
        return None;
    }
    Some(format!("{}/*", major))
}
