//! Package manifest cache.
//!
//! One [`PackageData`] per manifest, created on first touch and shared through
//! `Arc`. Records are keyed two ways: by manifest path (directory-as-package
//! lookups) and by `package id + basedir` (bare imports), so the same package
//! reached from two base directories is tracked separately.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use glob::{MatchOptions, Pattern};
use serde_json::Value;

use super::browser::BrowserField;
use super::exports::ExportsEntry;
use crate::error::ResolveError;

/// Manifest file name.
pub const PACKAGE_JSON: &str = "package.json";

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A cached resolution of one package subpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedImport {
    File(String),
    /// Stubbed out by the browser map.
    Excluded,
}

/// Side-effects declaration of a package.
#[derive(Debug, Clone)]
pub enum SideEffects {
    Constant(bool),
    /// Allow-list of globs, already resolved against the package directory.
    /// An empty list matches everything.
    Patterns(Vec<Pattern>),
}

impl SideEffects {
    fn from_manifest(value: Option<&Value>, dir: &Path) -> Self {
        match value {
            Some(Value::Bool(b)) => Self::Constant(*b),
            Some(Value::Array(items)) => {
                let base = Pattern::escape(&ridge_util::path::normalize_path(dir));
                let patterns = items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|raw| {
                        // slash-free wildcard globs (`*.css`) match at any depth;
                        // other relative patterns are anchored at the package root
                        let pattern = if raw.starts_with('*') && !raw.contains('/') {
                            format!("**/{raw}")
                        } else if raw.starts_with('*') || Path::new(raw).is_absolute() {
                            raw.to_string()
                        } else {
                            format!("{base}/{}", raw.trim_start_matches("./"))
                        };
                        match Pattern::new(&pattern) {
                            Ok(p) => Some(p),
                            Err(e) => {
                                tracing::debug!(
                                    pattern = %raw,
                                    error = %e,
                                    "ignoring invalid sideEffects pattern"
                                );
                                None
                            }
                        }
                    })
                    .collect();
                Self::Patterns(patterns)
            }
            _ => Self::Constant(true),
        }
    }
}

/// A loaded package manifest plus its per-package caches.
#[derive(Debug)]
pub struct PackageData {
    /// Package root directory.
    pub dir: PathBuf,
    /// `name` field.
    pub name: Option<String>,
    /// `version` field.
    pub version: Option<String>,
    /// Classified `exports` field.
    pub exports: Option<ExportsEntry>,
    /// Classified `browser` field.
    pub browser: Option<BrowserField>,
    side_effects: SideEffects,
    manifest: Value,
    resolved_imports: RwLock<HashMap<String, CachedImport>>,
}

impl PackageData {
    /// Build a record from manifest JSON located in `dir`.
    #[must_use]
    pub fn from_manifest(dir: PathBuf, manifest: Value) -> Self {
        let str_field = |key: &str| manifest.get(key).and_then(Value::as_str).map(String::from);
        Self {
            name: str_field("name"),
            version: str_field("version"),
            exports: manifest
                .get("exports")
                .filter(|v| !v.is_null())
                .map(ExportsEntry::from_value),
            browser: manifest.get("browser").and_then(BrowserField::from_value),
            side_effects: SideEffects::from_manifest(manifest.get("sideEffects"), &dir),
            dir,
            manifest,
            resolved_imports: RwLock::new(HashMap::new()),
        }
    }

    /// A string-valued manifest field such as `main` or `module`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.manifest.get(key).and_then(Value::as_str)
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(PACKAGE_JSON)
    }

    /// Whether evaluating `id` may have side effects.
    ///
    /// `id` is an absolute path (a `?query` suffix is ignored) or a path
    /// relative to the package directory.
    #[must_use]
    pub fn has_side_effects(&self, id: &str) -> bool {
        match &self.side_effects {
            SideEffects::Constant(b) => *b,
            SideEffects::Patterns(patterns) => {
                if patterns.is_empty() {
                    return true;
                }
                let (path, _) = ridge_util::url::split_query(id);
                let absolute = ridge_util::path::resolve(&self.dir, path);
                let candidate = ridge_util::path::normalize_path(&absolute);
                patterns
                    .iter()
                    .any(|p| p.matches_with(&candidate, GLOB_OPTIONS))
            }
        }
    }

    /// Previously resolved subpath (`.` for the package entry).
    #[must_use]
    pub fn resolved_import(&self, subpath: &str) -> Option<CachedImport> {
        self.resolved_imports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subpath)
            .cloned()
    }

    /// Record the resolution of a subpath.
    pub fn cache_import(&self, subpath: &str, resolved: CachedImport) {
        self.resolved_imports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subpath.to_string(), resolved);
    }
}

/// Owned manifest and association caches for one resolver instance.
#[derive(Debug, Default)]
pub struct PackageCache {
    packages: RwLock<HashMap<String, Arc<PackageData>>>,
    id_to_pkg: RwLock<HashMap<String, Arc<PackageData>>>,
}

impl PackageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or fetch from cache) the manifest at `manifest_path`.
    pub fn load_package_data(
        &self,
        manifest_path: &Path,
    ) -> Result<Arc<PackageData>, ResolveError> {
        let key = ridge_util::path::normalize_path(manifest_path);
        self.load_with_key(manifest_path, key)
    }

    fn load_with_key(
        &self,
        manifest_path: &Path,
        key: String,
    ) -> Result<Arc<PackageData>, ResolveError> {
        if let Some(pkg) = self.cached(&key) {
            return Ok(pkg);
        }

        let content = std::fs::read_to_string(manifest_path).map_err(|source| {
            ResolveError::ManifestRead {
                path: manifest_path.to_path_buf(),
                source,
            }
        })?;
        let manifest: Value =
            serde_json::from_str(&content).map_err(|source| ResolveError::ManifestParse {
                path: manifest_path.to_path_buf(),
                source,
            })?;
        let dir = manifest_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let pkg = Arc::new(PackageData::from_manifest(dir, manifest));
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&pkg));
        Ok(pkg)
    }

    /// Find `<id>/package.json` in the `node_modules` of `basedir` or any ancestor.
    ///
    /// Not found and unreadable manifests are both soft misses.
    #[must_use]
    pub fn resolve_package_data(&self, id: &str, basedir: &Path) -> Option<Arc<PackageData>> {
        let key = format!("{id}{}", basedir.display());
        if let Some(pkg) = self.cached(&key) {
            return Some(pkg);
        }

        let Some(manifest_path) = find_in_node_modules(id, basedir) else {
            tracing::debug!("[failed loading package.json] {id}");
            return None;
        };
        match self.load_with_key(&manifest_path, key) {
            Ok(pkg) => Some(pkg),
            Err(e) => {
                tracing::debug!(error = %e, "[failed loading package.json] {id}");
                None
            }
        }
    }

    fn cached(&self, key: &str) -> Option<Arc<PackageData>> {
        self.packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Associate a resolved module id with the package it came from.
    pub fn link(&self, resolved_id: &str, pkg: &Arc<PackageData>) {
        self.id_to_pkg
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resolved_id.to_string(), Arc::clone(pkg));
    }

    /// Package a previously resolved module id belongs to.
    #[must_use]
    pub fn package_of(&self, id: &str) -> Option<Arc<PackageData>> {
        self.id_to_pkg
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Drop every record rooted at `package_root` and the ids linked to it.
    ///
    /// Nothing in the resolver calls this; it exists for hosts that watch
    /// manifests.
    pub fn invalidate(&self, package_root: &Path) {
        let root = ridge_util::path::clean(package_root);
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, pkg| pkg.dir != root);
        self.id_to_pkg
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, pkg| pkg.dir != root);
    }

    /// Number of cached package records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no package has been loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn find_in_node_modules(id: &str, basedir: &Path) -> Option<PathBuf> {
    basedir
        .ancestors()
        .filter(|dir| dir.file_name().map_or(true, |name| name != "node_modules"))
        .map(|dir| dir.join("node_modules").join(id).join(PACKAGE_JSON))
        .find(|candidate| candidate.is_file())
}
