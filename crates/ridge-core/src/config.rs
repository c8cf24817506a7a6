use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional project config file.
pub const CONFIG_FILE: &str = "ridge.config.json";

/// Extensions tried by the filesystem candidate resolver, in order.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mjs", ".js", ".ts", ".jsx", ".tsx", ".json"];

/// Legacy entry fields consulted after `exports` and `browser`, in order.
pub const DEFAULT_MAIN_FIELDS: &[&str] = &["module", "main"];

/// Export conditions that win as soon as they are seen.
///
/// `require` and `default` are always recognized as fallbacks and are not
/// part of this list.
pub const DEFAULT_CONDITIONS: &[&str] = &["esmodules", "import", "module", "browser", "node"];

/// Resolution options shared by every request of one resolver instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveOptions {
    /// Project root. Root-relative URLs and deduped packages resolve from here.
    pub root: PathBuf,
    /// Base directory for relative specifiers that have no importer.
    pub cwd: PathBuf,
    /// Production build (`true`) or dev serve (`false`).
    pub is_build: bool,
    /// Source-serving mode: enables `/@fs/` paths, root-relative URLs and
    /// optimized-dependency shortcuts.
    pub as_src: bool,
    /// The build targets server-side rendering.
    pub ssr: bool,
    /// Packages that always resolve from `root`.
    pub dedupe: Vec<String>,
    /// Extensions to try (in order).
    pub extensions: Vec<String>,
    /// Legacy entry fields (in order).
    pub main_fields: Vec<String>,
    /// Recognized non-fallback export conditions.
    pub conditions: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            cwd: root.clone(),
            root,
            is_build: false,
            as_src: false,
            ssr: false,
            dedupe: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            main_fields: DEFAULT_MAIN_FIELDS.iter().map(|s| (*s).to_string()).collect(),
            conditions: DEFAULT_CONDITIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ResolveOptions {
    /// Options rooted at `root`, with `cwd` set to the same directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            cwd: root.clone(),
            root,
            ..Default::default()
        }
    }

    /// Set build mode.
    #[must_use]
    pub fn with_build(mut self, is_build: bool) -> Self {
        self.is_build = is_build;
        self
    }

    /// Set source-serving mode.
    #[must_use]
    pub fn with_as_src(mut self, as_src: bool) -> Self {
        self.as_src = as_src;
        self
    }

    /// Set the server-rendering build target.
    #[must_use]
    pub fn with_ssr(mut self, ssr: bool) -> Self {
        self.ssr = ssr;
        self
    }

    /// Set the dedupe list.
    #[must_use]
    pub fn with_dedupe(mut self, dedupe: Vec<String>) -> Self {
        self.dedupe = dedupe;
        self
    }
}

/// Runtime configuration for the ridge CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Resolver options, read from the `resolve` key of `ridge.config.json`.
    pub resolve: ResolveOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            resolve: ResolveOptions::default(),
        }
    }
}

/// On-disk shape of `ridge.config.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    resolve: Option<serde_json::Value>,
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            resolve: ResolveOptions::new(cwd.clone()),
            cwd,
            ..Default::default()
        }
    }

    /// Load `ridge.config.json` from `root`, falling back to defaults when absent.
    ///
    /// A relative `resolve.root` in the file is taken relative to `root`; a
    /// missing one means `root` itself. `resolve.cwd` defaults to the resolved root.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let mut config = Self::new(root.to_path_buf());
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let file: ConfigFile =
            serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
                path: path.clone(),
                source,
            })?;

        if let Some(value) = file.resolve {
            let has_root = value.get("root").is_some();
            let has_cwd = value.get("cwd").is_some();
            let mut resolve: ResolveOptions =
                serde_json::from_value(value).map_err(|source| Error::ConfigParse {
                    path: path.clone(),
                    source,
                })?;
            resolve.root = if has_root {
                ridge_util::path::clean(&root.join(&resolve.root))
            } else {
                root.to_path_buf()
            };
            resolve.cwd = if has_cwd {
                ridge_util::path::clean(&root.join(&resolve.cwd))
            } else {
                resolve.root.clone()
            };
            config.resolve = resolve;
        }
        Ok(config)
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let opts = ResolveOptions::new("/proj");
        assert_eq!(opts.cwd, PathBuf::from("/proj"));
        assert_eq!(opts.extensions[0], ".mjs");
        assert_eq!(opts.main_fields, vec!["module", "main"]);
        assert!(!opts.is_build);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.resolve.root, dir.path());
        assert!(config.resolve.dedupe.is_empty());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "resolve": { "root": "app", "isBuild": true, "dedupe": ["react"] } }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.resolve.root, dir.path().join("app"));
        assert_eq!(config.resolve.cwd, dir.path().join("app"));
        assert!(config.resolve.is_build);
        assert_eq!(config.resolve.dedupe, vec!["react"]);
        // Unspecified fields keep their defaults
        assert_eq!(config.resolve.main_fields, vec!["module", "main"]);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();

        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}
