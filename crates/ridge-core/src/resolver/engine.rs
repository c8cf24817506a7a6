//! The resolve plugin: specifier dispatch.
//!
//! Strategies run in a fixed order and the first one that claims a specifier
//! wins:
//!
//! 1. the empty-module marker passes through; commonjs proxies are skipped
//! 2. `/@fs/` paths (source-serving only), returned even when missing
//! 3. root-relative `/x` (source-serving only), falls through when missing
//! 4. relative paths, honouring the importer package's browser map
//! 5. absolute paths
//! 6. external URLs
//! 7. `data:` URLs (left to a later plugin)
//! 8. bare specifiers: optimized deps, `node_modules`, then Node built-ins

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ridge_util::path::{normalize_path, relative, resolve};

use super::browser::{map_with_browser_field, BrowserTarget};
use super::builtins::is_builtin;
use super::package::PackageCache;
use super::specifier::{
    fs_path_from_id, is_bare_import, is_commonjs_proxy, is_data_url, is_external_url,
    BROWSER_EXTERNAL_CODE, BROWSER_EXTERNAL_ID, FS_PREFIX,
};
use super::{ResolveContext, ResolveOutcome, ResolvedId};
use crate::config::ResolveOptions;
use crate::dev::DevSession;
use crate::error::ResolveError;
use crate::log::{LogOptions, Logger, TracingLogger};

/// Resolver instance owning its caches.
pub struct ResolvePlugin {
    options: ResolveOptions,
    packages: PackageCache,
    session: Option<Arc<DevSession>>,
    logger: Arc<dyn Logger>,
}

impl ResolvePlugin {
    /// Plugin name reported to the pipeline.
    pub const NAME: &'static str = "ridge:resolve";

    #[must_use]
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            options,
            packages: PackageCache::new(),
            session: None,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Route warnings through `logger`.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Attach the active dev session.
    pub fn configure_server(&mut self, session: Arc<DevSession>) {
        self.session = Some(session);
    }

    #[must_use]
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Manifest and association caches.
    #[must_use]
    pub fn packages(&self) -> &PackageCache {
        &self.packages
    }

    /// Forget everything cached for the package rooted at `package_root`.
    pub fn invalidate(&self, package_root: &Path) {
        self.packages.invalidate(package_root);
    }

    fn context(&self) -> ResolveContext<'_> {
        ResolveContext::new(&self.options, &self.packages).with_session(self.session.as_deref())
    }

    /// Resolve `id` imported from `importer`.
    pub fn resolve_id(
        &self,
        id: &str,
        importer: Option<&str>,
    ) -> Result<ResolveOutcome, ResolveError> {
        if id == BROWSER_EXTERNAL_ID {
            return Ok(ResolvedId::empty().into());
        }
        if is_commonjs_proxy(id) {
            return Ok(ResolveOutcome::NotApplicable);
        }

        let ctx = self.context();
        let as_src = self.options.as_src;

        if as_src && id.starts_with(FS_PREFIX) {
            let fs_path = fs_path_from_id(id);
            let res = ctx.try_fs_resolve(&fs_path, false)?;
            tracing::debug!("[@fs] {id} -> {res:?}");
            // a missing /@fs/ file is the caller's 404, not a reason to keep looking
            return Ok(ResolvedId::file(res.unwrap_or(fs_path)).into());
        }

        if as_src && id.starts_with('/') {
            let fs_path = normalize_path(&resolve(&self.options.root, &id[1..]));
            if let Some(res) = ctx.try_fs_resolve(&fs_path, true)? {
                tracing::debug!("[url] {id} -> {res}");
                return Ok(ResolvedId::file(res).into());
            }
        }

        if id.starts_with('.') {
            if let Some(outcome) = self.resolve_relative(&ctx, id, importer)? {
                return Ok(outcome.into());
            }
        }

        if Path::new(id).is_absolute() && !is_external_url(id) {
            if let Some(res) = ctx.try_fs_resolve(id, true)? {
                tracing::debug!("[fs] {id} -> {res}");
                return Ok(ResolvedId::file(res).into());
            }
        }

        if is_external_url(id) {
            return Ok(ResolvedId::external(id).into());
        }

        if is_data_url(id) {
            return Ok(ResolveOutcome::NotApplicable);
        }

        if is_bare_import(id) {
            if as_src {
                if let Some(res) = ctx.try_optimized_resolve(id) {
                    tracing::debug!("[optimized] {id} -> {res}");
                    return Ok(ResolvedId::file(res).into());
                }
            }

            let basedir = importer.map_or_else(|| self.options.root.clone(), importer_dir);
            if let Some(res) = ctx.try_node_resolve(id, &basedir)? {
                return Ok(res.into());
            }

            if is_builtin(id) {
                if self.options.is_build && self.options.ssr {
                    return Ok(ResolvedId::external(id).into());
                }
                self.logger.warn(
                    &format!(
                        "externalized node built-in \"{id}\" to empty module. (imported by: {})",
                        importer.unwrap_or("unknown")
                    ),
                    LogOptions::default(),
                );
                return Ok(ResolvedId::empty().into());
            }
        }

        tracing::debug!("[fallthrough] {id}");
        Ok(ResolveOutcome::NotApplicable)
    }

    fn resolve_relative(
        &self,
        ctx: &ResolveContext<'_>,
        id: &str,
        importer: Option<&str>,
    ) -> Result<Option<ResolvedId>, ResolveError> {
        let basedir = importer.map_or_else(|| self.options.cwd.clone(), importer_dir);
        let mut fs_path = normalize_path(&resolve(&basedir, id));

        let pkg = importer.and_then(|importer| {
            self.packages.package_of(importer).or_else(|| {
                let (path, _) = ridge_util::url::split_query(importer);
                self.packages.package_of(path)
            })
        });

        if let Some(pkg) = &pkg {
            if let Some(map) = pkg.browser.as_ref().and_then(|b| b.as_map()) {
                // browser keys are relative to the package root, not the importer
                let pkg_relative = format!("./{}", relative(&pkg.dir, Path::new(&fs_path)));
                match map_with_browser_field(&pkg_relative, map) {
                    BrowserTarget::Path(mapped) => {
                        fs_path = normalize_path(&resolve(&pkg.dir, &mapped));
                    }
                    BrowserTarget::Excluded => return Ok(Some(ResolvedId::empty())),
                }
            }
        }

        let Some(res) = ctx.try_fs_resolve(&fs_path, true)? else {
            return Ok(None);
        };
        tracing::debug!("[relative] {id} -> {res}");

        match pkg {
            Some(pkg) => {
                self.packages.link(&res, &pkg);
                let side_effects = pkg.has_side_effects(&res);
                Ok(Some(ResolvedId::file(res).with_side_effects(side_effects)))
            }
            None => Ok(Some(ResolvedId::file(res))),
        }
    }

    /// Source text for ids this plugin owns.
    #[must_use]
    pub fn load(&self, id: &str) -> Option<&'static str> {
        (id == BROWSER_EXTERNAL_ID).then_some(BROWSER_EXTERNAL_CODE)
    }
}

/// Directory of an importer id, ignoring any query.
fn importer_dir(importer: &str) -> PathBuf {
    let (path, _) = ridge_util::url::split_query(importer);
    Path::new(path)
        .parent()
        .map_or_else(|| PathBuf::from("/"), Path::to_path_buf)
}
