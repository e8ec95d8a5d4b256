//! Desktop entry lookup by application id

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::entry::{normalize_id, DesktopEntry, DESKTOP_SUFFIX};

/// Finds desktop entries by application id.
///
/// Ids may be given as `foo`, `foo.desktop` or an absolute path.
pub trait EntryLookup: Send + Sync {
    fn find_entry(&self, id: &str) -> Option<DesktopEntry>;
}

/// Looks entries up in XDG `applications` directories, first match wins
#[derive(Debug, Clone)]
pub struct DesktopEntryDirs {
    dirs: Vec<PathBuf>,
}

impl DesktopEntryDirs {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// The file an id resolves to, if any.
    ///
    /// Relative ids are plain file names; an id with a path separator that
    /// is not absolute resolves to nothing.
    pub fn find_path(&self, id: &str) -> Option<PathBuf> {
        let as_path = Path::new(id);
        if as_path.is_absolute() {
            return as_path.is_file().then(|| as_path.to_path_buf());
        }
        if id.contains('/') {
            debug!("Ignoring relative desktop entry path {}", id);
            return None;
        }

        let file_name = format!("{}{}", normalize_id(id), DESKTOP_SUFFIX);
        self.dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }
}

impl EntryLookup for DesktopEntryDirs {
    fn find_entry(&self, id: &str) -> Option<DesktopEntry> {
        let Some(path) = self.find_path(id) else {
            debug!("No desktop entry for {}", id);
            return None;
        };

        match DesktopEntry::load(&path) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cannot read desktop entry {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// In-memory entries keyed by id
impl EntryLookup for HashMap<String, DesktopEntry> {
    fn find_entry(&self, id: &str) -> Option<DesktopEntry> {
        let key = Path::new(id)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(id);
        self.get(normalize_id(key)).cloned()
    }
}
