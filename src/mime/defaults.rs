//! Default application store
//!
//! Defaults live in `defaults.list` files under `[Default Applications]`.
//! The user file in `$XDG_DATA_HOME/applications` overrides the system
//! files; only the user file is ever written. Edits touch a single line
//! and keep the rest of the file as is. Writes go to a temporary file that
//! is renamed over the original, and concurrent writers resolve as last
//! writer wins.

use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use super::cache::WatchedFile;
use super::error::{MimeError, MimeResult};
use crate::desktop::{normalize_id, DESKTOP_SUFFIX};

pub const DEFAULTS_SECTION: &str = "Default Applications";
pub const DEFAULTS_FILE: &str = "defaults.list";

#[derive(Debug)]
pub struct DefaultsStore {
    user: WatchedFile,
    system: Vec<WatchedFile>,
}

impl DefaultsStore {
    /// `user_path` is written by [`set`](Self::set); `system_paths` are
    /// read-only, highest priority first.
    pub fn new(user_path: PathBuf, system_paths: Vec<PathBuf>) -> Self {
        Self {
            user: WatchedFile::new(user_path, DEFAULTS_SECTION),
            system: system_paths
                .into_iter()
                .map(|path| WatchedFile::new(path, DEFAULTS_SECTION))
                .collect(),
        }
    }

    /// Re-read files whose modification time changed
    pub fn refresh(&mut self) {
        self.user.refresh();
        for file in &mut self.system {
            file.refresh();
        }
    }

    /// The default for exactly `content_type`: user file first, then the
    /// system files in order. A multi-valued entry yields its first item.
    pub fn get(&self, content_type: &str) -> Option<&str> {
        std::iter::once(&self.user)
            .chain(self.system.iter())
            .find_map(|file| {
                file.entries()
                    .iter()
                    .find(|(key, _)| key == content_type)
                    .and_then(|(_, apps)| apps.first())
            })
            .map(String::as_str)
    }

    /// Set the user default for `content_type` to `app_id`
    pub fn set(&mut self, content_type: &str, app_id: &str) -> MimeResult<()> {
        validate_content_type(content_type)?;
        let app_id = normalize_id(app_id.trim());
        if app_id.is_empty() || app_id.contains(|c: char| matches!(c, '=' | '\n' | ';')) {
            return Err(MimeError::InvalidAppId(app_id.to_string()));
        }

        let line_value = format!("{}{}", app_id, DESKTOP_SUFFIX);
        let current = self.read_user_file()?;
        if let Some(updated) = edit_section(&current, DEFAULTS_SECTION, content_type, Some(&line_value)) {
            self.write_user_file(&updated)?;
        }
        info!("Default for {} set to {}", content_type, app_id);
        Ok(())
    }

    /// Remove the user default for `content_type`. Removing a missing
    /// entry is not an error.
    pub fn reset(&mut self, content_type: &str) -> MimeResult<()> {
        validate_content_type(content_type)?;

        let current = self.read_user_file()?;
        let Some(updated) = edit_section(&current, DEFAULTS_SECTION, content_type, None) else {
            debug!("No user default for {} to reset", content_type);
            return Ok(());
        };
        self.write_user_file(&updated)?;
        info!("Default for {} reset", content_type);
        Ok(())
    }

    /// Current on-disk user file, empty when it does not exist yet
    fn read_user_file(&self) -> MimeResult<String> {
        let path = self.user.path();
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(MimeError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn write_user_file(&mut self, content: &str) -> MimeResult<()> {
        let path = self.user.path().to_path_buf();
        let write_error = |source| MimeError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let temp_path = path.with_extension("list.tmp");
        {
            let mut file = std::fs::File::create(&temp_path).map_err(write_error)?;
            file.write_all(content.as_bytes()).map_err(write_error)?;
            file.sync_all().map_err(write_error)?;
        }
        std::fs::rename(&temp_path, &path).map_err(write_error)?;

        // Pick up our own write even if the mtime did not move
        self.user = WatchedFile::new(path, DEFAULTS_SECTION);
        self.user.refresh();
        Ok(())
    }
}

/// Set (`Some`) or remove (`None`) `key` inside `section` of a key file,
/// leaving every other line as it was.
///
/// The first occurrence of the key is replaced and later duplicates in the
/// section are dropped. A new key goes after the last line of the section;
/// a missing section is appended. Returns `None` when nothing changes.
fn edit_section(content: &str, section: &str, key: &str, value: Option<&str>) -> Option<String> {
    let header = format!("[{}]", section);
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let mut in_section = false;
    let mut insert_at = None;
    let mut matched = Vec::new();

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.starts_with('[') && line.ends_with(']') {
            in_section = line == header;
            if in_section {
                insert_at = Some(index + 1);
            }
            continue;
        }
        if !in_section || line.is_empty() {
            continue;
        }
        insert_at = Some(index + 1);
        if line.starts_with('#') {
            continue;
        }
        if line.split_once('=').is_some_and(|(k, _)| k.trim() == key) {
            matched.push(index);
        }
    }

    match value {
        Some(value) => {
            let new_line = format!("{}={}", key, value);
            if let Some((&first, duplicates)) = matched.split_first() {
                if lines[first] == new_line && duplicates.is_empty() {
                    return None;
                }
                lines[first] = new_line;
                for &index in duplicates.iter().rev() {
                    lines.remove(index);
                }
            } else if let Some(at) = insert_at {
                lines.insert(at, new_line);
            } else {
                if lines.last().is_some_and(|last| !last.trim().is_empty()) {
                    lines.push(String::new());
                }
                lines.push(header);
                lines.push(new_line);
            }
        }
        None => {
            if matched.is_empty() {
                return None;
            }
            for &index in matched.iter().rev() {
                lines.remove(index);
            }
        }
    }

    let mut updated = lines.join("\n");
    updated.push('\n');
    Some(updated)
}

fn validate_content_type(content_type: &str) -> MimeResult<()> {
    let valid = content_type
        .split_once('/')
        .map_or(false, |(major, minor)| !major.is_empty() && !minor.is_empty())
        && !content_type.contains(|c: char| matches!(c, '=' | '\n' | '[' | ']'));
    if valid {
        Ok(())
    } else {
        Err(MimeError::InvalidContentType(content_type.to_string()))
    }
}
