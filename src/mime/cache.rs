//! Registry files: `mimeinfo.cache` and `defaults.list`
//!
//! Both are key files with one interesting section whose values are
//! `;`-separated lists of desktop file names:
//!
//! ```text
//! [MIME Cache]
//! image/png=viewer.desktop;editor.desktop;
//! ```

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

use crate::desktop::{normalize_id, split_list};

pub const MIME_CACHE_SECTION: &str = "MIME Cache";
pub const MIME_CACHE_FILE: &str = "mimeinfo.cache";

/// `content type -> application ids` in file order
pub type Associations = Vec<(String, Vec<String>)>;

/// Parse `section` of a registry file. Application ids lose their
/// `.desktop` suffix. Repeated keys keep their first value.
pub fn parse_section(content: &str, section: &str) -> Associations {
    let header = format!("[{}]", section);
    let mut in_section = false;
    let mut result: Associations = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || result.iter().any(|(k, _)| k == key) {
            continue;
        }
        let apps = split_list(value)
            .iter()
            .map(|app| normalize_id(app).to_string())
            .collect();
        result.push((key.to_string(), apps));
    }

    result
}

/// A registry file and the modification time it was last parsed at
#[derive(Debug, Clone)]
pub(crate) struct WatchedFile {
    path: PathBuf,
    section: &'static str,
    modified: Option<SystemTime>,
    entries: Associations,
}

impl WatchedFile {
    pub(crate) fn new(path: PathBuf, section: &'static str) -> Self {
        Self {
            path,
            section,
            modified: None,
            entries: Vec::new(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn entries(&self) -> &Associations {
        &self.entries
    }

    /// Re-parse the file if its modification time changed. Returns whether
    /// the entries changed.
    pub(crate) fn refresh(&mut self) -> bool {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    debug!("No registry file at {}", self.path.display());
                } else {
                    warn!("Cannot stat {}: {}", self.path.display(), e);
                }
                let had_entries = self.modified.is_some();
                self.modified = None;
                self.entries.clear();
                return had_entries;
            }
        };

        if self.modified == Some(modified) {
            return false;
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                self.entries = parse_section(&content, self.section);
                self.modified = Some(modified);
                debug!(
                    path = %self.path.display(),
                    types = self.entries.len(),
                    "Parsed registry file"
                );
                true
            }
            Err(e) => {
                warn!("Cannot read {}: {}", self.path.display(), e);
                self.entries.clear();
                self.modified = None;
                true
            }
        }
    }
}

/// Merged view of every `mimeinfo.cache` in the data directories.
///
/// Files are re-examined at most once per refresh interval, and within a
/// scan only files whose modification time changed are parsed again.
#[derive(Debug)]
pub struct MimeInfoCache {
    files: Vec<WatchedFile>,
    refresh_interval: Duration,
    last_scan: Option<Instant>,
    merged: HashMap<String, Vec<String>>,
}

impl MimeInfoCache {
    /// Cache over `<dir>/mimeinfo.cache` for each of `application_dirs`,
    /// highest priority first
    pub fn new(application_dirs: &[PathBuf], refresh_interval: Duration) -> Self {
        Self::with_files(
            application_dirs
                .iter()
                .map(|dir| dir.join(MIME_CACHE_FILE))
                .collect(),
            refresh_interval,
        )
    }

    pub fn with_files(paths: Vec<PathBuf>, refresh_interval: Duration) -> Self {
        Self {
            files: paths
                .into_iter()
                .map(|path| WatchedFile::new(path, MIME_CACHE_SECTION))
                .collect(),
            refresh_interval,
            last_scan: None,
            merged: HashMap::new(),
        }
    }

    /// Rescan if the refresh interval has elapsed since the last scan.
    /// Returns whether a scan happened.
    pub fn refresh(&mut self) -> bool {
        let due = self
            .last_scan
            .map_or(true, |last| last.elapsed() >= self.refresh_interval);
        if due {
            self.rescan();
        }
        due
    }

    /// Rescan now, regardless of the interval
    pub fn rescan(&mut self) {
        let mut changed = false;
        for file in &mut self.files {
            changed |= file.refresh();
        }
        self.last_scan = Some(Instant::now());

        if changed {
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        let mut merged: HashMap<String, Vec<String>> = HashMap::new();
        for file in &self.files {
            for (content_type, apps) in file.entries() {
                let list = merged.entry(content_type.clone()).or_default();
                for app in apps {
                    if !list.contains(app) {
                        list.push(app.clone());
                    }
                }
            }
        }
        debug!(types = merged.len(), "Application registry rebuilt");
        self.merged = merged;
    }

    /// Applications registered for exactly `content_type`, from the last scan
    pub fn apps(&self, content_type: &str) -> &[String] {
        self.merged
            .get(content_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
