//! Module specifier resolver.
//!
//! [`ResolvePlugin`] is the entry point: it classifies a specifier and
//! dispatches to the filesystem, package or URL strategies. Results are
//! explicit: [`ResolveOutcome::Resolved`] claims the specifier,
//! [`ResolveOutcome::NotApplicable`] lets the next plugin try, and `Err`
//! stops the request.

pub mod browser;
pub mod builtins;
pub mod engine;
pub mod exports;
mod fs;
pub mod node;
pub mod package;
pub mod specifier;

pub use browser::{map_with_browser_field, BrowserField, BrowserTarget};
pub use builtins::is_builtin;
pub use engine::ResolvePlugin;
pub use exports::{resolve_exports, ExportsEntry};
pub use package::{CachedImport, PackageCache, PackageData};
pub use specifier::{classify, SpecifierKind, BROWSER_EXTERNAL_ID, FS_PREFIX};

use crate::config::ResolveOptions;
use crate::dev::DevSession;

/// Canonical identity of a resolved module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleId {
    /// Absolute path, with any query suffix preserved.
    File(String),
    /// Left to the host at runtime.
    External(String),
    /// The synthetic empty module.
    Empty,
}

impl ModuleId {
    /// The id as the plugin pipeline sees it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::File(id) | Self::External(id) => id,
            Self::Empty => BROWSER_EXTERNAL_ID,
        }
    }

    /// `file`, `external` or `empty`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::External(_) => "external",
            Self::Empty => "empty",
        }
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved module plus what tree-shaking should assume about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub id: ModuleId,
    /// `None` leaves the decision to the bundler.
    pub module_side_effects: Option<bool>,
}

impl ResolvedId {
    #[must_use]
    pub fn file(id: impl Into<String>) -> Self {
        Self {
            id: ModuleId::File(id.into()),
            module_side_effects: None,
        }
    }

    #[must_use]
    pub fn external(id: impl Into<String>) -> Self {
        Self {
            id: ModuleId::External(id.into()),
            module_side_effects: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: ModuleId::Empty,
            module_side_effects: None,
        }
    }

    #[must_use]
    pub fn with_side_effects(mut self, side_effects: bool) -> Self {
        self.module_side_effects = Some(side_effects);
        self
    }
}

/// Result of one resolution strategy or of the whole resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved(ResolvedId),
    /// No opinion; later strategies or plugins may handle the specifier.
    NotApplicable,
}

impl ResolveOutcome {
    /// The resolved id, if any.
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedId> {
        match self {
            Self::Resolved(id) => Some(id),
            Self::NotApplicable => None,
        }
    }
}

impl From<ResolvedId> for ResolveOutcome {
    fn from(id: ResolvedId) -> Self {
        Self::Resolved(id)
    }
}

/// Borrowed state one resolution runs against.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub options: &'a ResolveOptions,
    pub packages: &'a PackageCache,
    pub session: Option<&'a DevSession>,
}

impl<'a> ResolveContext<'a> {
    #[must_use]
    pub fn new(options: &'a ResolveOptions, packages: &'a PackageCache) -> Self {
        Self {
            options,
            packages,
            session: None,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: Option<&'a DevSession>) -> Self {
        self.session = session;
        self
    }
}
