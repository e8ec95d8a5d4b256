//! The resolution context
//!
//! [`ContentActions`] owns every cache resolution needs and turns content
//! (files, uris, strings, semantic objects, raw content types) into
//! [`Action`]s.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};
use url::Url;

use super::classes::{ClassResolver, NoClasses};
use crate::action::{classify, Action, Invocation, InvocationBackend, SystemBackend};
use crate::config::parse_config_dir;
use crate::core::types::scheme_mime;
use crate::core::{ContentKey, Result, Settings};
use crate::desktop::{to_local_path, DesktopEntryDirs, EntryLookup};
use crate::highlight::{Highlighter, Match, Span};
use crate::mime::{AppIndex, ExtensionDetector, MimeDetector};

/// Resolution context.
///
/// Cheap to query repeatedly: highlight rules are loaded on first use and
/// the application index rescans its files at most once per refresh
/// interval. All methods take `&self`; the index is behind a lock.
pub struct ContentActions {
    settings: Settings,
    highlighter: OnceLock<Highlighter>,
    index: Mutex<AppIndex>,
    entries: Box<dyn EntryLookup>,
    backend: Arc<dyn InvocationBackend>,
    classes: Box<dyn ClassResolver>,
    detector: Box<dyn MimeDetector>,
}

impl ContentActions {
    /// Context over the real system described by `settings`
    pub fn new(settings: Settings) -> Self {
        info!(
            actions_dir = %settings.actions_dir.display(),
            data_home = %settings.data_home.display(),
            "Creating content action context"
        );
        Self {
            index: Mutex::new(AppIndex::from_settings(&settings)),
            entries: Box::new(DesktopEntryDirs::new(settings.application_dirs())),
            backend: Arc::new(SystemBackend::new()),
            classes: Box::new(NoClasses),
            detector: Box::new(ExtensionDetector),
            highlighter: OnceLock::new(),
            settings,
        }
    }

    /// Context configured from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Settings::from_env()?))
    }

    pub fn with_entry_lookup(mut self, entries: impl EntryLookup + 'static) -> Self {
        self.entries = Box::new(entries);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn InvocationBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_class_resolver(mut self, classes: impl ClassResolver + 'static) -> Self {
        self.classes = Box::new(classes);
        self
    }

    pub fn with_detector(mut self, detector: impl MimeDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Use `highlighter` instead of reading the actions directory
    pub fn with_highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = OnceLock::from(highlighter);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Highlight rules, read from the actions directory on first use
    pub fn highlighter(&self) -> &Highlighter {
        self.highlighter.get_or_init(|| {
            let config = parse_config_dir(&self.settings.actions_dir);
            Highlighter::from_config(&config)
        })
    }

    // ========================================================================
    // Core resolution
    // ========================================================================

    /// Candidate application ids for one key, in priority order
    fn candidates(&self, key: &ContentKey) -> Vec<String> {
        let mut index = self.index.lock();
        let mut apps: Vec<String> = Vec::new();
        for content_type in key.content_types() {
            for app in index.apps_for(content_type) {
                if !apps.contains(&app) {
                    apps.push(app);
                }
            }
        }
        apps
    }

    /// Applications able to handle every key, in the first key's order
    fn common_candidates(&self, keys: &[ContentKey]) -> Vec<String> {
        let Some((first, rest)) = keys.split_first() else {
            return Vec::new();
        };

        let mut apps = self.candidates(first);
        for key in rest {
            if apps.is_empty() {
                break;
            }
            let other = self.candidates(key);
            apps.retain(|app| other.contains(app));
        }
        apps
    }

    /// Action for `app_id`, or `None` when the entry is missing, malformed
    /// or not invocable
    fn build_action(&self, app_id: &str, params: &[String]) -> Option<Action> {
        let entry = self.entries.find_entry(app_id)?;
        match classify(&entry, params, &self.settings) {
            Ok(invocation) if invocation.is_valid() => Some(Action::new(
                entry,
                params.to_vec(),
                invocation,
                self.backend.clone(),
            )),
            Ok(_) => {
                debug!("{} can not be invoked", app_id);
                None
            }
            Err(e) => {
                debug!("Dropping {}: {}", app_id, e);
                None
            }
        }
    }

    /// Actions applicable to all of `keys`, each bound to `params`
    pub fn actions_for_keys(&self, keys: &[ContentKey], params: &[String]) -> Vec<Action> {
        self.common_candidates(keys)
            .iter()
            .filter_map(|app| self.build_action(app, params))
            .collect()
    }

    /// The default action applicable to all of `keys`.
    ///
    /// The first content type of the first key with a usable default
    /// decides. Otherwise the first applicable action is used, and the
    /// invalid action when there is none.
    pub fn default_action_for_keys(&self, keys: &[ContentKey], params: &[String]) -> Action {
        let candidates = self.common_candidates(keys);
        if candidates.is_empty() {
            return Action::invalid();
        }

        let defaults: Vec<String> = match keys.first() {
            Some(key) => {
                let mut index = self.index.lock();
                key.content_types()
                    .into_iter()
                    .filter_map(|content_type| index.default_app_for(content_type))
                    .collect()
            }
            None => Vec::new(),
        };

        defaults
            .iter()
            .filter(|app| candidates.contains(app))
            .find_map(|app| self.build_action(app, params))
            .or_else(|| {
                candidates
                    .iter()
                    .find_map(|app| self.build_action(app, params))
            })
            .unwrap_or_else(Action::invalid)
    }

    // ========================================================================
    // Content types
    // ========================================================================

    /// Actions for a content type, without parameters
    pub fn actions_for_mime(&self, content_type: &str) -> Vec<Action> {
        self.actions_for_keys(&[ContentKey::file_mime(content_type)], &[])
    }

    pub fn default_action_for_mime(&self, content_type: &str) -> Action {
        self.default_action_for_keys(&[ContentKey::file_mime(content_type)], &[])
    }

    /// The configured default application id, if any
    pub fn default_app_for_mime(&self, content_type: &str) -> Option<String> {
        self.index.lock().default_app_for(content_type)
    }

    /// Persist `app_id` as the user's default for `content_type`
    pub fn set_mime_default(&self, content_type: &str, app_id: &str) -> Result<()> {
        info!(content_type, app_id, "Setting default application");
        self.index.lock().set_default(content_type, app_id)?;
        Ok(())
    }

    /// Remove the user's default for `content_type`
    pub fn reset_mime_default(&self, content_type: &str) -> Result<()> {
        info!(content_type, "Resetting default application");
        self.index.lock().reset_default(content_type)?;
        Ok(())
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Content type of a local file. `file:` uris are accepted.
    pub fn mime_for_file(&self, file: &str) -> Option<String> {
        self.detector.mime_for_path(&local_path(file))
    }

    fn file_keys_and_params(&self, files: &[String]) -> Option<(Vec<ContentKey>, Vec<String>)> {
        let mut keys = Vec::with_capacity(files.len());
        let mut params = Vec::with_capacity(files.len());
        for file in files {
            let Some(mime) = self.mime_for_file(file) else {
                debug!("No content type for {}", file);
                return None;
            };
            keys.push(ContentKey::file_mime(mime));
            params.push(file_uri(file));
        }
        Some((keys, params))
    }

    pub fn actions_for_file(&self, file: &str) -> Vec<Action> {
        self.actions_for_files(&[file.to_string()])
    }

    pub fn default_action_for_file(&self, file: &str) -> Action {
        self.default_action_for_files(&[file.to_string()])
    }

    /// Actions able to open all `files` at once
    pub fn actions_for_files(&self, files: &[String]) -> Vec<Action> {
        match self.file_keys_and_params(files) {
            Some((keys, params)) => self.actions_for_keys(&keys, &params),
            None => Vec::new(),
        }
    }

    pub fn default_action_for_files(&self, files: &[String]) -> Action {
        match self.file_keys_and_params(files) {
            Some((keys, params)) => self.default_action_for_keys(&keys, &params),
            None => Action::invalid(),
        }
    }

    // ========================================================================
    // URI schemes
    // ========================================================================

    pub fn mime_for_scheme(&self, uri: &str) -> String {
        scheme_mime(uri)
    }

    pub fn actions_for_scheme(&self, uri: &str) -> Vec<Action> {
        self.actions_for_keys(&[ContentKey::uri_scheme(uri)], &[uri.to_string()])
    }

    pub fn default_action_for_scheme(&self, uri: &str) -> Action {
        self.default_action_for_keys(&[ContentKey::uri_scheme(uri)], &[uri.to_string()])
    }

    // ========================================================================
    // Strings
    // ========================================================================

    /// Pseudo-mimes of the highlight rules matching all of `text`
    pub fn mimes_for_string(&self, text: &str) -> Vec<String> {
        self.highlighter().mimes_for_string(text)
    }

    /// Union of the actions of every matching rule, in rule order
    pub fn actions_for_string(&self, text: &str) -> Vec<Action> {
        let params = [text.to_string()];
        let mut actions: Vec<Action> = Vec::new();
        for mime in self.mimes_for_string(text) {
            for action in self.actions_for_keys(&[ContentKey::text_match(&mime)], &params) {
                if !actions.iter().any(|known| known.name() == action.name()) {
                    actions.push(action);
                }
            }
        }
        actions
    }

    /// Default of the first matching rule that has one, else the first
    /// action for the string
    pub fn default_action_for_string(&self, text: &str) -> Action {
        let params = [text.to_string()];
        for mime in self.mimes_for_string(text) {
            let Some(app) = self.default_app_for_mime(&mime) else {
                continue;
            };
            if let Some(action) = self.build_action(&app, &params) {
                return action;
            }
        }
        self.actions_for_string(text)
            .into_iter()
            .next()
            .unwrap_or_else(Action::invalid)
    }

    // ========================================================================
    // Semantic objects
    // ========================================================================

    pub fn mimes_for_tracker(&self, uri: &str) -> Vec<String> {
        self.classes.classes_of(uri)
    }

    fn tracker_keys(&self, uris: &[String]) -> Vec<ContentKey> {
        uris.iter()
            .map(|uri| ContentKey::semantic_classes(self.mimes_for_tracker(uri)))
            .collect()
    }

    pub fn actions_for_tracker(&self, uri: &str) -> Vec<Action> {
        self.actions_for_tracker_uris(&[uri.to_string()])
    }

    pub fn default_action_for_tracker(&self, uri: &str) -> Action {
        self.default_action_for_tracker_uris(&[uri.to_string()])
    }

    /// Actions applicable to every object in `uris`
    pub fn actions_for_tracker_uris(&self, uris: &[String]) -> Vec<Action> {
        self.actions_for_keys(&self.tracker_keys(uris), uris)
    }

    pub fn default_action_for_tracker_uris(&self, uris: &[String]) -> Action {
        self.default_action_for_keys(&self.tracker_keys(uris), uris)
    }

    // ========================================================================
    // Desktop entries
    // ========================================================================

    /// Action launching the entry `desktop` (an id or a path) with `params`.
    ///
    /// `None` when the entry does not exist. An entry that can not be
    /// invoked yields an action that is not valid.
    pub fn launcher_action(&self, desktop: &str, params: &[String]) -> Option<Action> {
        let entry = self.entries.find_entry(desktop)?;
        let invocation = match classify(&entry, params, &self.settings) {
            Ok(invocation) => invocation,
            Err(e) => {
                debug!("{} is malformed: {}", desktop, e);
                Invocation::Invalid
            }
        };
        Some(Action::new(
            entry,
            params.to_vec(),
            invocation,
            self.backend.clone(),
        ))
    }

    // ========================================================================
    // Highlighting
    // ========================================================================

    fn is_actionable(&self, mime: &str) -> bool {
        self.index.lock().has_apps(mime)
    }

    /// Non-overlapping highlights of `text`.
    ///
    /// With `highlight_actionable_only` set, rules without applications
    /// are skipped.
    pub fn find_highlights(&self, text: &str) -> Vec<Span> {
        if self.settings.highlight_actionable_only {
            self.highlighter()
                .find_highlights_where(text, |mime| self.is_actionable(mime))
        } else {
            self.highlighter().find_highlights(text)
        }
    }

    /// Highlights starting in `start..end`
    pub fn find_highlights_in(&self, text: &str, start: usize, end: usize) -> Vec<Span> {
        self.find_highlights(text)
            .into_iter()
            .filter(|span| span.start >= start && span.start < end)
            .collect()
    }

    /// First highlight starting at or after `from`
    pub fn find_next_highlight(&self, text: &str, from: usize) -> Option<Span> {
        self.find_highlights(text)
            .into_iter()
            .find(|span| span.start >= from)
    }

    /// Legacy overlapping highlight with the actions of each match
    pub fn highlight(&self, text: &str) -> Vec<Match> {
        self.highlighter().highlight(text, |mime, matched| {
            self.actions_for_keys(&[ContentKey::text_match(mime)], &[matched.to_string()])
        })
    }
}

impl std::fmt::Debug for ContentActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentActions")
            .field("settings", &self.settings)
            .field("highlighter_loaded", &self.highlighter.get().is_some())
            .finish()
    }
}

/// Filesystem path for a path or `file:` uri argument
fn local_path(file: &str) -> PathBuf {
    PathBuf::from(to_local_path(file))
}

/// `file:` uri for a path argument. Uris are passed through.
pub fn file_uri(file: &str) -> String {
    if Url::parse(file).is_ok_and(|url| url.scheme().len() > 1) {
        return file.to_string();
    }

    let path = Path::new(file);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|_| file.to_string())
}
