//! Module graph slots read and written by the SSR loader.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use ridge_util::path::resolve;
use ridge_util::url::split_query;

use super::namespace::ModuleNamespace;
use crate::resolver::specifier::{fs_path_from_id, FS_PREFIX};

/// One module URL's entry.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub url: String,
    /// Backing file, when the URL maps to one.
    pub file: Option<PathBuf>,
    /// Evaluated namespace, populated at most once.
    pub ssr_module: Option<ModuleNamespace>,
}

impl ModuleRecord {
    #[must_use]
    pub fn new(url: impl Into<String>, file: Option<PathBuf>) -> Self {
        Self {
            url: url.into(),
            file,
            ssr_module: None,
        }
    }
}

/// The module graph as seen by the SSR loader.
///
/// Records are returned by value; the loader only ever writes the
/// `ssr_module` slot through [`ModuleGraph::set_ssr_module`].
pub trait ModuleGraph: Send + Sync {
    /// Fetch the record for `url`, creating it if absent.
    fn ensure_entry(&self, url: &str) -> ModuleRecord;

    fn lookup_by_url(&self, url: &str) -> Option<ModuleRecord>;

    fn set_ssr_module(&self, url: &str, namespace: ModuleNamespace);
}

/// In-memory graph keyed by URL.
#[derive(Debug)]
pub struct MemoryModuleGraph {
    root: PathBuf,
    modules: RwLock<HashMap<String, ModuleRecord>>,
}

impl MemoryModuleGraph {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// Map a URL to the file it serves.
    ///
    /// `/@fs/` URLs name absolute files. Anything else starting with `/` is
    /// under the root. Bare URLs have no file.
    #[must_use]
    pub fn file_for_url(&self, url: &str) -> Option<PathBuf> {
        let (path, _) = split_query(url);
        if path.starts_with(FS_PREFIX) {
            return Some(PathBuf::from(fs_path_from_id(path)));
        }
        let rel = path.strip_prefix('/')?;
        Some(resolve(&self.root, rel))
    }

    /// Drop the evaluated namespace for `url` so the next load re-evaluates.
    pub fn invalidate(&self, url: &str) -> bool {
        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        match modules.get_mut(url) {
            Some(record) => record.ssr_module.take().is_some(),
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModuleGraph for MemoryModuleGraph {
    fn ensure_entry(&self, url: &str) -> ModuleRecord {
        if let Some(record) = self.lookup_by_url(url) {
            return record;
        }
        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        modules
            .entry(url.to_string())
            .or_insert_with(|| ModuleRecord::new(url, self.file_for_url(url)))
            .clone()
    }

    fn lookup_by_url(&self, url: &str) -> Option<ModuleRecord> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    fn set_ssr_module(&self, url: &str, namespace: ModuleNamespace) {
        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        modules
            .entry(url.to_string())
            .or_insert_with(|| ModuleRecord::new(url, self.file_for_url(url)))
            .ssr_module = Some(namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_file_for_url() {
        let graph = MemoryModuleGraph::new("/app");
        assert_eq!(
            graph.file_for_url("/src/main.ts?t=1"),
            Some(PathBuf::from("/app/src/main.ts"))
        );
        assert_eq!(
            graph.file_for_url("/@fs/opt/lib/x.js"),
            Some(PathBuf::from("/opt/lib/x.js"))
        );
        assert_eq!(graph.file_for_url("virtual:thing"), None);
    }

    #[test]
    fn test_ensure_entry_is_stable() {
        let graph = MemoryModuleGraph::new("/app");
        assert!(graph.lookup_by_url("/a.js").is_none());

        let record = graph.ensure_entry("/a.js");
        assert_eq!(record.url, "/a.js");
        assert_eq!(record.file.as_deref(), Some(Path::new("/app/a.js")));
        assert!(record.ssr_module.is_none());

        graph.ensure_entry("/a.js");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_set_and_invalidate_ssr_module() {
        let graph = MemoryModuleGraph::new("/app");
        let ns = ModuleNamespace::new();
        graph.set_ssr_module("/a.js", ns.clone());

        let stored = graph.lookup_by_url("/a.js").unwrap().ssr_module.unwrap();
        assert!(stored.ptr_eq(&ns));

        assert!(graph.invalidate("/a.js"));
        assert!(graph.lookup_by_url("/a.js").unwrap().ssr_module.is_none());
        assert!(!graph.invalidate("/a.js"));
        assert!(!graph.invalidate("/missing.js"));
    }
}
