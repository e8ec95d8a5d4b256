//! The action handle

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::backend::{dispatch, InvocationBackend};
use super::error::{InvocationError, InvocationResult};
use super::invocation::Invocation;
use crate::desktop::DesktopEntry;

/// An application bound to parameters.
///
/// Cheap to clone. Actions compare equal when they name the same
/// application with the same parameters and invocation.
#[derive(Clone)]
pub struct Action {
    inner: Arc<ActionInner>,
}

struct ActionInner {
    entry: Option<DesktopEntry>,
    params: Vec<String>,
    invocation: Invocation,
    backend: Option<Arc<dyn InvocationBackend>>,
}

impl Action {
    pub fn new(
        entry: DesktopEntry,
        params: Vec<String>,
        invocation: Invocation,
        backend: Arc<dyn InvocationBackend>,
    ) -> Self {
        Self {
            inner: Arc::new(ActionInner {
                entry: Some(entry),
                params,
                invocation,
                backend: Some(backend),
            }),
        }
    }

    /// The action that does nothing
    pub fn invalid() -> Self {
        Self {
            inner: Arc::new(ActionInner {
                entry: None,
                params: Vec::new(),
                invocation: Invocation::Invalid,
                backend: None,
            }),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.inner.entry.is_some() && self.inner.invocation.is_valid()
    }

    /// Application id, without `.desktop`. Empty for the invalid action.
    pub fn name(&self) -> &str {
        self.inner.entry.as_ref().map(DesktopEntry::id).unwrap_or("")
    }

    /// Display name in `locale`, falling back to the plain name and then
    /// the application id
    pub fn localized_name(&self, locale: &str) -> String {
        self.inner
            .entry
            .as_ref()
            .and_then(|entry| entry.localized_name(locale))
            .map(str::to_string)
            .unwrap_or_else(|| self.name().to_string())
    }

    pub fn icon(&self) -> Option<&str> {
        self.inner.entry.as_ref().and_then(DesktopEntry::icon)
    }

    pub fn entry(&self) -> Option<&DesktopEntry> {
        self.inner.entry.as_ref()
    }

    pub fn params(&self) -> &[String] {
        &self.inner.params
    }

    pub fn invocation(&self) -> &Invocation {
        &self.inner.invocation
    }

    /// Fire and forget. Returns whether the invocation was handed off.
    pub fn trigger(&self) -> bool {
        self.run(false)
    }

    /// Trigger and block until the process exits or the call replies
    pub fn trigger_and_wait(&self) -> bool {
        self.run(true)
    }

    /// Trigger, returning the failure instead of logging it
    pub fn try_trigger(&self, wait: bool) -> InvocationResult<()> {
        match (&self.inner.backend, self.is_valid()) {
            (Some(backend), true) => {
                dispatch(backend.as_ref(), &self.inner.invocation, &self.inner.params, wait)
            }
            _ => Err(InvocationError::InvalidAction),
        }
    }

    fn run(&self, wait: bool) -> bool {
        if !self.is_valid() {
            warn!("Triggering an invalid action");
            return false;
        }

        debug!(
            "Triggering {} via {} with {:?}",
            self.name(),
            self.inner.invocation.kind(),
            self.inner.params
        );
        match self.try_trigger(wait) {
            Ok(()) => true,
            Err(e) => {
                warn!("Triggering {} failed: {}", self.name(), e);
                false
            }
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::invalid()
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
            && self.params() == other.params()
            && self.invocation() == other.invocation()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name())
            .field("params", &self.inner.params)
            .field("invocation", &self.inner.invocation)
            .finish()
    }
}
