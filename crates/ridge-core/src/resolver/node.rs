//! Bare specifier resolution: package entries, deep imports and pre-bundled
//! dependency shortcuts.

use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;
use ridge_util::path::{normalize_path, resolve};

use super::browser::{map_with_browser_field, BrowserTarget};
use super::exports::resolve_exports;
use super::package::{CachedImport, PackageData};
use super::specifier::{is_css_request, split_package_id};
use super::{ModuleId, ResolveContext, ResolvedId};
use crate::error::ResolveError;

/// Entry used when a manifest names none.
pub const DEFAULT_ENTRY: &str = "index.js";

struct UmdSignatures {
    typeof_exports: Regex,
    typeof_module: Regex,
    module_exports: Regex,
}

fn umd_signatures() -> Option<&'static UmdSignatures> {
    static SIGS: OnceLock<Option<UmdSignatures>> = OnceLock::new();
    SIGS.get_or_init(|| {
        Some(UmdSignatures {
            typeof_exports: Regex::new(r"typeof exports\s*==").ok()?,
            typeof_module: Regex::new(r"typeof module\s*==").ok()?,
            module_exports: Regex::new(r"module\.exports\s*=").ok()?,
        })
    })
    .as_ref()
}

/// Textual sniff for UMD or CommonJS output.
///
/// This is a heuristic: it matches `typeof exports ==` together with
/// `typeof module ==`, or any `module.exports =` assignment, and can be fooled
/// by comments or strings containing those signatures.
#[must_use]
pub fn looks_like_umd(content: &str) -> bool {
    umd_signatures().is_some_and(|sigs| {
        (sigs.typeof_exports.is_match(content) && sigs.typeof_module.is_match(content))
            || sigs.module_exports.is_match(content)
    })
}

impl ResolveContext<'_> {
    /// Resolve a bare specifier from `basedir` through `node_modules`.
    ///
    /// `Ok(None)` when the package cannot be found; the caller may then try
    /// built-ins.
    pub fn try_node_resolve(
        &self,
        id: &str,
        basedir: &Path,
    ) -> Result<Option<ResolvedId>, ResolveError> {
        let (pkg_id, deep) = split_package_id(id);

        let basedir = if self.options.dedupe.iter().any(|d| d == pkg_id) {
            self.options.root.as_path()
        } else {
            basedir
        };

        let Some(pkg) = self.packages.resolve_package_data(pkg_id, basedir) else {
            return Ok(None);
        };

        if deep.is_some() {
            self.guard_optimized_deep_import(id, pkg_id, &pkg)?;
        }

        let resolved = match deep {
            Some(rest) => self.resolve_deep_import(&format!(".{rest}"), &pkg)?,
            None => Some(CachedImport::File(self.resolve_package_entry(id, &pkg)?)),
        };

        let resolved = match resolved {
            None => return Ok(None),
            Some(CachedImport::Excluded) => return Ok(Some(ResolvedId::empty())),
            Some(CachedImport::File(file)) => file,
        };

        // relative imports made from inside the package consult its browser map
        self.packages.link(&resolved, &pkg);

        if self.options.is_build {
            let side_effects = pkg.has_side_effects(&resolved);
            return Ok(Some(ResolvedId::file(resolved).with_side_effects(side_effects)));
        }

        // Version-tag real dependencies so the browser caches them; linked
        // monorepo packages live outside node_modules and stay untagged.
        let mut resolved = resolved;
        if resolved.contains("node_modules") {
            if let Some(hash) = self.session.and_then(|s| s.version_hash()) {
                resolved = ridge_util::url::inject_query(&resolved, &format!("v={hash}"));
            }
        }
        Ok(Some(ResolvedId::file(resolved)))
    }

    fn guard_optimized_deep_import(
        &self,
        id: &str,
        pkg_id: &str,
        pkg: &PackageData,
    ) -> Result<(), ResolveError> {
        let Some(session) = self.session else {
            return Ok(());
        };
        let Some(optimized) = &session.optimized else {
            return Ok(());
        };
        let name = pkg.name.as_deref().unwrap_or(pkg_id);
        if optimized.contains(name) && !is_css_request(id) && !session.is_asset_request(id) {
            return Err(ResolveError::DeepImportOptimized {
                id: id.to_string(),
                package: name.to_string(),
            });
        }
        Ok(())
    }

    /// Shortcut to the pre-bundled file of `raw_id`, keeping its query.
    #[must_use]
    pub fn try_optimized_resolve(&self, raw_id: &str) -> Option<String> {
        let session = self.session?;
        let deps = session.optimized.as_ref()?;
        let (id, query) = ridge_util::url::split_query(raw_id);
        let file = deps.get(id)?;
        Some(format!("{}{query}", normalize_path(&session.cache_dir.join(file))))
    }

    /// Resolve the root entry of `pkg`.
    ///
    /// Priority: `exports["."]`, the browser entry (unless it looks like UMD
    /// while a distinct `module` field exists), the main fields, `index.js`.
    /// The chosen entry is mapped through an object `browser` field and must
    /// exist on disk.
    pub fn resolve_package_entry(
        &self,
        id: &str,
        pkg: &PackageData,
    ) -> Result<String, ResolveError> {
        if let Some(CachedImport::File(cached)) = pkg.resolved_import(".") {
            return Ok(cached);
        }

        let mut entry: Option<String> = pkg
            .exports
            .as_ref()
            .and_then(|exports| resolve_exports(exports, ".", &self.options.conditions));

        if entry.is_none() {
            entry = self.browser_entry(pkg)?;
        }

        if entry.is_none() {
            entry = self
                .options
                .main_fields
                .iter()
                .find_map(|field| pkg.field(field))
                .map(String::from);
        }

        let mut entry = entry.unwrap_or_else(|| DEFAULT_ENTRY.to_string());

        if let Some(map) = pkg.browser.as_ref().and_then(|b| b.as_map()) {
            if let BrowserTarget::Path(mapped) = map_with_browser_field(&entry, map) {
                entry = mapped;
            }
        }

        let candidate = normalize_path(&resolve(&pkg.dir, &entry));
        let own_root = normalize_path(&pkg.dir);
        match self.try_fs_resolve_within(&candidate, true, Some(&own_root))? {
            Some(resolved) => {
                tracing::debug!("[package entry] {id} -> {resolved}");
                pkg.cache_import(".", CachedImport::File(resolved.clone()));
                Ok(resolved)
            }
            None => Err(ResolveError::PackageEntryNotFound {
                package: id.to_string(),
            }),
        }
    }

    /// Browser entry candidate, after the UMD tie-break against `module`.
    fn browser_entry(&self, pkg: &PackageData) -> Result<Option<String>, ResolveError> {
        let Some(browser) = pkg.browser.as_ref().and_then(|b| b.entry()) else {
            return Ok(None);
        };

        let module = match pkg.field("module") {
            Some(module) if module != browser => module,
            _ => return Ok(Some(browser.to_string())),
        };

        // Some packages point "module" at Node ESM and "browser" at UMD.
        let candidate = normalize_path(&resolve(&pkg.dir, browser));
        let Some(resolved) = self.try_fs_resolve(&candidate, true)? else {
            return Ok(None);
        };
        let (file, _) = ridge_util::url::split_query(&resolved);
        let content = match ridge_util::fs::read_to_string_lossy(Path::new(file)) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %file, error = %e, "could not read browser entry");
                return Ok(Some(browser.to_string()));
            }
        };
        if looks_like_umd(&content) {
            Ok(Some(module.to_string()))
        } else {
            Ok(Some(browser.to_string()))
        }
    }

    /// Resolve `subpath` (`./x`) inside `pkg`.
    ///
    /// A declared `exports` field is authoritative and exhaustive. Without one,
    /// the browser map applies and `false` yields [`CachedImport::Excluded`].
    pub fn resolve_deep_import(
        &self,
        subpath: &str,
        pkg: &PackageData,
    ) -> Result<Option<CachedImport>, ResolveError> {
        if let Some(cached) = pkg.resolved_import(subpath) {
            return Ok(Some(cached));
        }

        let relative = if let Some(exports) = &pkg.exports {
            let target = if exports.is_root_only() {
                None
            } else {
                resolve_exports(exports, subpath, &self.options.conditions)
            };
            target.ok_or_else(|| ResolveError::SubpathNotExported {
                subpath: subpath.to_string(),
                manifest: pkg.manifest_path(),
            })?
        } else if let Some(map) = pkg.browser.as_ref().and_then(|b| b.as_map()) {
            match map_with_browser_field(subpath, map) {
                BrowserTarget::Path(mapped) => mapped,
                BrowserTarget::Excluded => {
                    pkg.cache_import(subpath, CachedImport::Excluded);
                    return Ok(Some(CachedImport::Excluded));
                }
            }
        } else {
            subpath.to_string()
        };

        // exports never imply index files
        let try_index = pkg.exports.is_none();
        let candidate = normalize_path(&resolve(&pkg.dir, &relative));
        let own_root = normalize_path(&pkg.dir);
        let found = self.try_fs_resolve_within(&candidate, try_index, Some(&own_root))?;
        let Some(resolved) = found else {
            if pkg.exports.is_some() {
                return Err(ResolveError::ExportedFileNotFound {
                    subpath: subpath.to_string(),
                    target: relative,
                    manifest: pkg.manifest_path(),
                });
            }
            return Ok(None);
        };
        tracing::debug!("[node/deep-import] {subpath} -> {resolved}");
        let resolved = CachedImport::File(resolved);
        pkg.cache_import(subpath, resolved.clone());
        Ok(Some(resolved))
    }
}

impl ResolvedId {
    /// The file path of a resolved file id.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        match &self.id {
            ModuleId::File(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolveOptions;
    use crate::dev::{DevSession, OptimizedDeps};
    use crate::resolver::PackageCache;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_pkg(root: &Path, name: &str, manifest: &Value, files: &[(&str, &str)]) -> PathBuf {
        let dir = root.join("node_modules").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), manifest.to_string()).unwrap();
        for (file, content) in files {
            let path = dir.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_looks_like_umd() {
        assert!(looks_like_umd(
            "(function (g, f) { typeof exports === 'object' && typeof module == 'object' ? f(exports) : 0 })"
        ));
        // `!==` is not the `==` signature
        assert!(!looks_like_umd(
            "typeof exports === 'object' && typeof module !== 'undefined'"
        ));
        assert!(looks_like_umd("module.exports = require('./x')"));
        assert!(!looks_like_umd("export default 1; // typeof exports == 'x'"));
    }

    #[test]
    fn test_exports_entry_wins() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "dep",
            &json!({
                "name": "dep",
                "main": "main.js",
                "exports": { ".": { "import": "./esm.js" } }
            }),
            &[("main.js", ""), ("esm.js", "")],
        );
        let options = ResolveOptions::new(dir.path()).with_build(true);
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("dep", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("node_modules/dep/esm.js"));
        assert_eq!(res.module_side_effects, Some(true));
    }

    #[test]
    fn test_umd_browser_entry_prefers_module() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "umd",
            &json!({
                "name": "umd",
                "browser": "dist/umd.js",
                "module": "dist/esm.js",
                "main": "dist/cjs.js"
            }),
            &[
                ("dist/umd.js", "typeof exports == 'object'; typeof module == 'object';"),
                ("dist/esm.js", "export {}"),
                ("dist/cjs.js", ""),
            ],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("umd", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("dist/esm.js"));
    }

    #[test]
    fn test_esm_browser_entry_is_used() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "esm",
            &json!({ "name": "esm", "browser": "dist/browser.js", "module": "dist/node.js" }),
            &[("dist/browser.js", "export default 1"), ("dist/node.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("esm", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("dist/browser.js"));
    }

    #[test]
    fn test_main_fields_then_default_entry() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "m",
            &json!({ "name": "m", "main": "lib/main" }),
            &[("lib/main.js", "")],
        );
        write_pkg(dir.path(), "plain", &json!({ "name": "plain" }), &[("index.js", "")]);
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let m = ctx.try_node_resolve("m", dir.path()).unwrap().unwrap();
        assert!(m.file_path().unwrap().ends_with("m/lib/main.js"));
        let plain = ctx.try_node_resolve("plain", dir.path()).unwrap().unwrap();
        assert!(plain.file_path().unwrap().ends_with("plain/index.js"));
    }

    #[test]
    fn test_entry_mapped_through_browser_map() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "mapped",
            &json!({
                "name": "mapped",
                "main": "./node.js",
                "browser": { "./node.js": "./browser.js" }
            }),
            &[("node.js", ""), ("browser.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("mapped", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("mapped/browser.js"));
    }

    #[test]
    fn test_missing_entry_is_fatal() {
        let dir = tempdir().unwrap();
        write_pkg(dir.path(), "broken", &json!({ "name": "broken", "main": "gone.js" }), &[]);
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let err = ctx.try_node_resolve("broken", dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::PackageEntryNotFound { ref package } if package == "broken"
        ));
    }

    #[test]
    fn test_entry_is_cached() {
        let dir = tempdir().unwrap();
        let pkg_dir = write_pkg(dir.path(), "dep", &json!({ "name": "dep" }), &[("index.js", "")]);
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let first = ctx.try_node_resolve("dep", dir.path()).unwrap().unwrap();
        // the cached entry survives the file disappearing
        fs::remove_file(pkg_dir.join("index.js")).unwrap();
        let second = ctx.try_node_resolve("dep", dir.path()).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_deep_import_through_exports_pattern() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "feat",
            &json!({
                "name": "feat",
                "exports": { ".": "./index.js", "./feature/*": "./lib/*.js" }
            }),
            &[("index.js", ""), ("lib/x.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("feat/feature/x", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("node_modules/feat/lib/x.js"));
    }

    #[test]
    fn test_deep_import_not_exported() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "closed",
            &json!({ "name": "closed", "exports": { ".": "./index.js" } }),
            &[("index.js", ""), ("secret.js", "")],
        );
        write_pkg(
            dir.path(),
            "str",
            &json!({ "name": "str", "exports": "./index.js" }),
            &[("index.js", ""), ("other.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let err = ctx.try_node_resolve("closed/secret.js", dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::SubpathNotExported { ref subpath, .. } if subpath == "./secret.js"
        ));
        let err = ctx.try_node_resolve("str/other.js", dir.path()).unwrap_err();
        assert!(matches!(err, ResolveError::SubpathNotExported { .. }));
    }

    #[test]
    fn test_exports_driven_deep_import_skips_index() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "dirs",
            &json!({ "name": "dirs", "exports": { "./utils": "./utils" } }),
            &[("utils/index.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let err = ctx.try_node_resolve("dirs/utils", dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ExportedFileNotFound { ref target, .. } if target == "./utils"
        ));
    }

    #[test]
    fn test_exported_target_missing_on_disk_is_fatal() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "dep",
            &json!({
                "name": "dep",
                "exports": { ".": "./index.js", "./feature": "./lib/feature.js" }
            }),
            &[("index.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let err = ctx.try_node_resolve("dep/feature", dir.path()).unwrap_err();
        match err {
            ResolveError::ExportedFileNotFound { subpath, target, manifest } => {
                assert_eq!(subpath, "./feature");
                assert_eq!(target, "./lib/feature.js");
                assert!(manifest.ends_with("node_modules/dep/package.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_main_pointing_at_package_root_uses_index() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "dotmain",
            &json!({ "name": "dotmain", "main": "." }),
            &[("index.js", "")],
        );
        write_pkg(
            dir.path(),
            "slashmain",
            &json!({ "name": "slashmain", "main": "./" }),
            &[("index.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("dotmain", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("node_modules/dotmain/index.js"));
        let res = ctx.try_node_resolve("slashmain", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("node_modules/slashmain/index.js"));
    }

    #[test]
    fn test_deep_import_browser_excluded() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "b",
            &json!({ "name": "b", "browser": { "./server.js": false } }),
            &[("index.js", ""), ("server.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("b/server", dir.path()).unwrap().unwrap();
        assert_eq!(res.id, ModuleId::Empty);
    }

    #[test]
    fn test_deep_import_without_exports_uses_index() {
        let dir = tempdir().unwrap();
        write_pkg(dir.path(), "open", &json!({ "name": "open" }), &[("utils/index.ts", "")]);
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("open/utils", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("open/utils/index.ts"));
    }

    #[test]
    fn test_scoped_package() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "@scope/pkg",
            &json!({ "name": "@scope/pkg", "main": "main.js" }),
            &[("main.js", ""), ("sub/a.js", "")],
        );
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let entry = ctx.try_node_resolve("@scope/pkg", dir.path()).unwrap().unwrap();
        assert!(entry.file_path().unwrap().ends_with("@scope/pkg/main.js"));
        let deep = ctx.try_node_resolve("@scope/pkg/sub/a", dir.path()).unwrap().unwrap();
        assert!(deep.file_path().unwrap().ends_with("@scope/pkg/sub/a.js"));
    }

    #[test]
    fn test_dedupe_resolves_from_root() {
        let dir = tempdir().unwrap();
        write_pkg(dir.path(), "react", &json!({ "name": "react" }), &[("index.js", "root")]);
        let nested = dir.path().join("packages").join("app");
        write_pkg(&nested, "react", &json!({ "name": "react" }), &[("index.js", "nested")]);
        let packages = PackageCache::new();

        let plain = ResolveOptions::new(dir.path());
        let ctx = ResolveContext::new(&plain, &packages);
        let res = ctx.try_node_resolve("react", &nested).unwrap().unwrap();
        assert!(res.file_path().unwrap().contains("packages/app/node_modules/react"));

        let deduped = ResolveOptions::new(dir.path()).with_dedupe(vec!["react".to_string()]);
        let ctx = ResolveContext::new(&deduped, &packages);
        let res = ctx.try_node_resolve("react", &nested).unwrap().unwrap();
        assert!(!res.file_path().unwrap().contains("packages/app"));
    }

    #[test]
    fn test_serve_mode_injects_version_query() {
        let dir = tempdir().unwrap();
        write_pkg(dir.path(), "dep", &json!({ "name": "dep" }), &[("index.js", "")]);
        let options = ResolveOptions::new(dir.path());
        let packages = PackageCache::new();
        let session = DevSession::new(dir.path().join(".cache")).with_optimized(OptimizedDeps {
            hash: "abcd1234".to_string(),
            optimized: BTreeMap::new(),
        });
        let ctx = ResolveContext::new(&options, &packages).with_session(Some(&session));

        let res = ctx.try_node_resolve("dep", dir.path()).unwrap().unwrap();
        assert!(res.file_path().unwrap().ends_with("dep/index.js?v=abcd1234"));
        assert_eq!(res.module_side_effects, None);
    }

    #[test]
    fn test_build_mode_side_effects() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "pure",
            &json!({ "name": "pure", "sideEffects": false }),
            &[("index.js", "")],
        );
        let options = ResolveOptions::new(dir.path()).with_build(true);
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("pure", dir.path()).unwrap().unwrap();
        assert_eq!(res.module_side_effects, Some(false));
        assert!(!res.file_path().unwrap().contains("?v="));
    }

    #[test]
    fn test_deep_import_into_optimized_dep_is_rejected() {
        let dir = tempdir().unwrap();
        write_pkg(
            dir.path(),
            "lodash-es",
            &json!({ "name": "lodash-es" }),
            &[("index.js", ""), ("get.js", ""), ("style.css", "")],
        );
        let options = ResolveOptions::new(dir.path()).with_as_src(true);
        let packages = PackageCache::new();
        let session = DevSession::new(dir.path().join(".cache")).with_optimized(OptimizedDeps::new(
            BTreeMap::from([("lodash-es".to_string(), "lodash-es.js".to_string())]),
        ));
        let ctx = ResolveContext::new(&options, &packages).with_session(Some(&session));

        let err = ctx.try_node_resolve("lodash-es/get", dir.path()).unwrap_err();
        assert!(err.is_usage_error());
        // stylesheets are exempt
        assert!(ctx.try_node_resolve("lodash-es/style.css", dir.path()).unwrap().is_some());
    }

    #[test]
    fn test_try_optimized_resolve() {
        let dir = tempdir().unwrap();
        let options = ResolveOptions::new(dir.path()).with_as_src(true);
        let packages = PackageCache::new();
        let optimized = BTreeMap::from([("react".to_string(), "react.js".to_string())]);
        let session = DevSession::new("/proj/node_modules/.ridge")
            .with_optimized(OptimizedDeps::new(optimized));
        let ctx = ResolveContext::new(&options, &packages).with_session(Some(&session));

        assert_eq!(
            ctx.try_optimized_resolve("react?import"),
            Some("/proj/node_modules/.ridge/react.js?import".to_string())
        );
        assert_eq!(ctx.try_optimized_resolve("vue"), None);
    }

    #[test]
    fn test_links_resolved_id_to_package() {
        let dir = tempdir().unwrap();
        write_pkg(dir.path(), "dep", &json!({ "name": "dep" }), &[("index.js", "")]);
        let options = ResolveOptions::new(dir.path()).with_build(true);
        let packages = PackageCache::new();
        let ctx = ResolveContext::new(&options, &packages);

        let res = ctx.try_node_resolve("dep", dir.path()).unwrap().unwrap();
        let pkg = packages.package_of(res.file_path().unwrap()).unwrap();
        assert_eq!(pkg.name.as_deref(), Some("dep"));
    }
}
