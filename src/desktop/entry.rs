//! Desktop entry model and parser

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The main section of every desktop entry
pub const DESKTOP_ENTRY_SECTION: &str = "Desktop Entry";
pub const DESKTOP_SUFFIX: &str = ".desktop";

/// A parsed `.desktop` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    id: String,
    path: PathBuf,
    sections: HashMap<String, HashMap<String, String>>,
}

/// Strip a trailing `.desktop` from an application id
pub fn normalize_id(id: &str) -> &str {
    id.strip_suffix(DESKTOP_SUFFIX).unwrap_or(id)
}

impl DesktopEntry {
    /// Parse the textual content of an entry stored at `path`.
    ///
    /// Comment lines and lines before the first section header are ignored.
    /// Values have the string escapes (`\s`, `\n`, `\t`, `\r`, `\\`) applied.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| normalize_id(n).to_string())
            .unwrap_or_default();

        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some(section) = current.as_ref() else {
                continue;
            };

            if let Some((key, value)) = line.split_once('=') {
                let values = sections.entry(section.clone()).or_default();
                // The first occurrence of a key wins
                values
                    .entry(key.trim().to_string())
                    .or_insert_with(|| unescape_value(value.trim()));
            }
        }

        Self { id, path, sections }
    }

    /// Read and parse an entry file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &content))
    }

    /// Application id: the file name without `.desktop`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `<id>.desktop`
    pub fn file_name(&self) -> String {
        format!("{}{}", self.id, DESKTOP_SUFFIX)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A key of the `[Desktop Entry]` section
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_in(DESKTOP_ENTRY_SECTION, key)
    }

    /// A key of an arbitrary section
    pub fn get_in(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|values| values.get(key))
            .map(String::as_str)
    }

    /// A non-empty key of the `[Desktop Entry]` section
    pub fn get_nonempty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Boolean key of the `[Desktop Entry]` section; absent means false
    pub fn get_bool(&self, key: &str) -> bool {
        parse_bool(self.get(key))
    }

    /// Semicolon separated list value
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(split_list).unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.get_nonempty("Name")
    }

    /// `Name[locale]` using the usual locale fallback chain, else `Name`
    pub fn localized_name(&self, locale: &str) -> Option<&str> {
        locale_candidates(locale)
            .iter()
            .find_map(|candidate| {
                self.get_nonempty(&format!("Name[{}]", candidate))
            })
            .or_else(|| self.name())
    }

    pub fn icon(&self) -> Option<&str> {
        self.get_nonempty("Icon")
    }

    pub fn exec(&self) -> Option<&str> {
        self.get_nonempty("Exec")
    }

    pub fn terminal(&self) -> bool {
        self.get_bool("Terminal")
    }
}

/// Accepts `true`, `1` and `yes`, case-insensitively
pub fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("true") | Some("1") | Some("yes")
    )
}

/// Split a `;`-separated value, dropping empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn unescape_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => result.push(' '),
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            // Unknown escapes are kept for the Exec quoting rules
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Locale keys to try, most specific first: `lang_COUNTRY@MODIFIER`,
/// `lang_COUNTRY`, `lang@MODIFIER`, `lang`. Any `.ENCODING` is ignored.
pub fn locale_candidates(locale: &str) -> Vec<String> {
    let (rest, modifier) = match locale.split_once('@') {
        Some((rest, modifier)) => (rest, Some(modifier)),
        None => (locale, None),
    };
    let rest = rest.split('.').next().unwrap_or(rest);
    let (lang, country) = match rest.split_once('_') {
        Some((lang, country)) => (lang, Some(country)),
        None => (rest, None),
    };

    if lang.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::with_capacity(4);
    if let (Some(country), Some(modifier)) = (country, modifier) {
        candidates.push(format!("{}_{}@{}", lang, country, modifier));
    }
    if let Some(country) = country {
        candidates.push(format!("{}_{}", lang, country));
    }
    if let Some(modifier) = modifier {
        candidates.push(format!("{}@{}", lang, modifier));
    }
    candidates.push(lang.to_string());
    candidates
}
