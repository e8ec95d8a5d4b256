//! Application index
//!
//! Combines the registry cache and the defaults store into the two tables
//! resolution needs: candidate applications per content type and the
//! default application per content type.

use tracing::trace;

use super::cache::MimeInfoCache;
use super::defaults::DefaultsStore;
use super::error::MimeResult;
use crate::core::types::generalize;
use crate::core::Settings;

#[derive(Debug)]
pub struct AppIndex {
    cache: MimeInfoCache,
    defaults: DefaultsStore,
}

impl AppIndex {
    pub fn new(cache: MimeInfoCache, defaults: DefaultsStore) -> Self {
        Self { cache, defaults }
    }

    /// Index over the data directories named by `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        let cache = MimeInfoCache::new(&settings.application_dirs(), settings.refresh_interval());
        let defaults = DefaultsStore::new(
            settings.user_defaults_path(),
            settings.system_defaults_paths(),
        );
        Self::new(cache, defaults)
    }

    /// Rescan registry and defaults files when the refresh interval allows
    pub fn refresh(&mut self) {
        if self.cache.refresh() {
            self.defaults.refresh();
        }
    }

    /// Candidate applications for `content_type`.
    ///
    /// The exact type's applications come first, then those of its `type/*`
    /// generalization. The default application, when there is one, is moved
    /// (or added) to the front. Duplicates are removed, keeping the first
    /// occurrence.
    pub fn apps_for(&mut self, content_type: &str) -> Vec<String> {
        self.refresh();

        let mut raw: Vec<String> = self.cache.apps(content_type).to_vec();
        if let Some(general) = generalize(content_type) {
            raw.extend(self.cache.apps(&general).iter().cloned());
        }

        let default = self.lookup_default(content_type);
        let mut result = Vec::with_capacity(raw.len() + 1);
        if let Some(default) = default {
            result.push(default);
        }
        for app in raw {
            if !result.contains(&app) {
                result.push(app);
            }
        }

        trace!(content_type, apps = ?result, "Applications resolved");
        result
    }

    /// Default application for `content_type`, falling back to its
    /// generalization
    pub fn default_app_for(&mut self, content_type: &str) -> Option<String> {
        self.refresh();
        self.lookup_default(content_type)
    }

    fn lookup_default(&self, content_type: &str) -> Option<String> {
        if let Some(app) = self.defaults.get(content_type) {
            return Some(app.to_string());
        }
        let general = generalize(content_type)?;
        self.defaults.get(&general).map(str::to_string)
    }

    /// Whether any application handles `content_type`
    pub fn has_apps(&mut self, content_type: &str) -> bool {
        !self.apps_for(content_type).is_empty()
    }

    pub fn set_default(&mut self, content_type: &str, app_id: &str) -> MimeResult<()> {
        self.defaults.set(content_type, app_id)
    }

    pub fn reset_default(&mut self, content_type: &str) -> MimeResult<()> {
        self.defaults.reset(content_type)
    }
}
