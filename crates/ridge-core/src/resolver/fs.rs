//! Filesystem candidate resolution.

use std::path::Path;

use ridge_util::fs::{entry_kind, EntryKind};
use ridge_util::path::normalize_path;
use ridge_util::url::split_query;

use super::package::PACKAGE_JSON;
use super::ResolveContext;
use crate::error::ResolveError;

impl ResolveContext<'_> {
    /// Resolve a path fragment to an existing file.
    ///
    /// Tries the literal path, then each configured extension. A directory
    /// with a `package.json` resolves to its package entry; otherwise, when
    /// `try_index` is set, to `dir/index` plus an extension. A `?query` on the
    /// input is re-appended to the result.
    pub fn try_fs_resolve(
        &self,
        fs_path: &str,
        try_index: bool,
    ) -> Result<Option<String>, ResolveError> {
        self.try_fs_resolve_within(fs_path, try_index, None)
    }

    /// [`Self::try_fs_resolve`] for an entry of the package rooted at
    /// `own_root`. That directory is never re-entered as a package, so an
    /// entry like `"main": "."` falls back to its index file.
    pub(super) fn try_fs_resolve_within(
        &self,
        fs_path: &str,
        try_index: bool,
        own_root: Option<&str>,
    ) -> Result<Option<String>, ResolveError> {
        let (file, query) = split_query(fs_path);
        if let Some(res) = self.try_resolve_file(file, query, try_index, own_root)? {
            return Ok(Some(res));
        }
        for ext in &self.options.extensions {
            let candidate = format!("{file}{ext}");
            if let Some(res) = self.try_resolve_file(&candidate, query, try_index, own_root)? {
                return Ok(Some(res));
            }
        }
        Ok(None)
    }

    fn try_resolve_file(
        &self,
        file: &str,
        query: &str,
        try_index: bool,
        own_root: Option<&str>,
    ) -> Result<Option<String>, ResolveError> {
        let path = Path::new(file);
        match entry_kind(path) {
            Some(EntryKind::File) => Ok(Some(format!("{}{query}", normalize_path(path)))),
            Some(EntryKind::Dir) => {
                let manifest = path.join(PACKAGE_JSON);
                let is_own_root = own_root.is_some_and(|root| normalize_path(path) == root);
                if !is_own_root && manifest.is_file() {
                    let pkg = self.packages.load_package_data(&manifest)?;
                    return self.resolve_package_entry(file, &pkg).map(Some);
                }
                if try_index {
                    // index lookup never descends into further directories
                    let index = self.try_fs_resolve(&format!("{file}/index"), false)?;
                    return Ok(index.map(|index| format!("{index}{query}")));
                }
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
