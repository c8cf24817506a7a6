//! Dev-session state seen by the resolver.
//!
//! Pre-bundled ("optimized") dependencies live in the cache directory next to
//! a `_metadata.json` describing them:
//!
//! ```json
//! { "hash": "1a2b3c4d", "optimized": { "react": "react.js" } }
//! ```
//!
//! Bare imports of listed specifiers resolve straight to those files, deep
//! imports into them are rejected, and the hash version-tags `node_modules`
//! URLs served to the browser.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Metadata file inside the optimized-deps cache directory.
pub const METADATA_FILE: &str = "_metadata.json";

/// Extensions always served as assets.
const KNOWN_ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "mp4", "webm", "ogg", "mp3", "wav",
    "flac", "aac", "woff", "woff2", "eot", "ttf", "otf", "webmanifest", "pdf", "txt",
];

/// Pre-bundled dependency map plus its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedDeps {
    /// Version hash for the whole set.
    pub hash: String,
    /// Specifier → bundled file, relative to the cache directory.
    pub optimized: BTreeMap<String, String>,
}

impl OptimizedDeps {
    /// Build metadata for `optimized`, hashing the map.
    #[must_use]
    pub fn new(optimized: BTreeMap<String, String>) -> Self {
        let mut seed = String::new();
        for (spec, file) in &optimized {
            seed.push_str(spec);
            seed.push('\0');
            seed.push_str(file);
            seed.push('\n');
        }
        Self {
            hash: ridge_util::hash::short_hash(seed.as_bytes()),
            optimized,
        }
    }

    /// Read `<cache_dir>/_metadata.json`; `Ok(None)` when it does not exist.
    pub fn load(cache_dir: &Path) -> Result<Option<Self>, Error> {
        let path = cache_dir.join(METADATA_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let deps = serde_json::from_str(&content)
            .map_err(|source| Error::ConfigParse { path, source })?;
        Ok(Some(deps))
    }

    /// Bundled file for `specifier`, relative to the cache directory.
    #[must_use]
    pub fn get(&self, specifier: &str) -> Option<&str> {
        self.optimized.get(specifier).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, specifier: &str) -> bool {
        self.optimized.contains_key(specifier)
    }
}

/// State of an active dev server, attached to the resolver with
/// `ResolvePlugin::configure_server`.
#[derive(Debug, Clone)]
pub struct DevSession {
    /// Directory holding the optimized deps.
    pub cache_dir: PathBuf,
    /// Metadata for the optimized deps, once optimization ran.
    pub optimized: Option<OptimizedDeps>,
    assets_include: Vec<Pattern>,
}

impl DevSession {
    /// Session with no optimized deps yet.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            optimized: None,
            assets_include: Vec::new(),
        }
    }

    /// Session reading its metadata from `cache_dir`.
    pub fn load(cache_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let cache_dir = cache_dir.into();
        let optimized = OptimizedDeps::load(&cache_dir)?;
        Ok(Self {
            cache_dir,
            optimized,
            assets_include: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_optimized(mut self, deps: OptimizedDeps) -> Self {
        self.optimized = Some(deps);
        self
    }

    /// Extra glob patterns treated as assets.
    ///
    /// Invalid patterns are skipped.
    #[must_use]
    pub fn with_assets_include<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        self.assets_include = patterns
            .iter()
            .filter_map(|p| match Pattern::new(p.as_ref()) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(
                        pattern = p.as_ref(),
                        error = %e,
                        "ignoring invalid assetsInclude pattern"
                    );
                    None
                }
            })
            .collect();
        self
    }

    /// Hash used to version-tag dependency URLs.
    #[must_use]
    pub fn version_hash(&self) -> Option<&str> {
        self.optimized.as_ref().map(|deps| deps.hash.as_str())
    }

    /// Whether `id` names an asset (image, font, media) rather than code.
    #[must_use]
    pub fn is_asset_request(&self, id: &str) -> bool {
        let (path, _) = ridge_util::url::split_query(id);
        let ext = ridge_util::path::extname(path).trim_start_matches('.');
        if KNOWN_ASSET_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
        {
            return true;
        }
        self.assets_include.iter().any(|p| p.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn deps() -> OptimizedDeps {
        OptimizedDeps::new(BTreeMap::from([
            ("lodash-es".to_string(), "lodash-es.js".to_string()),
            ("react".to_string(), "react.js".to_string()),
        ]))
    }

    #[test]
    fn test_hash_is_stable_and_short() {
        let a = deps();
        let b = deps();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash.len(), 8);

        let other = OptimizedDeps::new(BTreeMap::from([("vue".to_string(), "vue.js".to_string())]));
        assert_ne!(a.hash, other.hash);
    }

    #[test]
    fn test_load_metadata() {
        let dir = tempdir().unwrap();
        assert!(OptimizedDeps::load(dir.path()).unwrap().is_none());

        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{ "hash": "abcd1234", "optimized": { "react": "react.js" } }"#,
        )
        .unwrap();
        let session = DevSession::load(dir.path()).unwrap();
        assert_eq!(session.version_hash(), Some("abcd1234"));
        assert_eq!(session.optimized.unwrap().get("react"), Some("react.js"));
    }

    #[test]
    fn test_load_invalid_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), "{").unwrap();
        assert!(matches!(
            DevSession::load(dir.path()),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_is_asset_request() {
        let session = DevSession::new("/cache").with_assets_include(&["**/*.gltf", "["]);
        assert!(session.is_asset_request("lib/logo.PNG"));
        assert!(session.is_asset_request("lib/font.woff2?url"));
        assert!(session.is_asset_request("models/scene.gltf"));
        assert!(!session.is_asset_request("lib/index.js"));
    }
}
