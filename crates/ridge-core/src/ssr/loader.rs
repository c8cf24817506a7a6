//! Depth-first SSR module loading.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use super::graph::ModuleGraph;
use super::host::{
    Evaluator, HostRequire, IdentityStackRewriter, StackRewriter, TransformOptions,
    TransformPipeline,
};
use super::namespace::ModuleNamespace;
use crate::error::LoaderError;
use crate::log::{LogOptions, Logger, TracingLogger};

/// Dependencies not starting with `.` or `/` are required from the host.
fn is_external_dep(dep: &str) -> bool {
    !dep.starts_with('.') && !dep.starts_with('/')
}

struct LoaderInner {
    graph: Arc<dyn ModuleGraph>,
    transform: Arc<dyn TransformPipeline>,
    evaluator: Arc<dyn Evaluator>,
    require: Arc<dyn HostRequire>,
    stack_rewriter: Arc<dyn StackRewriter>,
    logger: Arc<dyn Logger>,
}

/// Builder for [`SsrModuleLoader`].
pub struct SsrModuleLoaderBuilder {
    graph: Arc<dyn ModuleGraph>,
    transform: Arc<dyn TransformPipeline>,
    evaluator: Arc<dyn Evaluator>,
    require: Arc<dyn HostRequire>,
    stack_rewriter: Arc<dyn StackRewriter>,
    logger: Arc<dyn Logger>,
}

impl SsrModuleLoaderBuilder {
    pub fn stack_rewriter(mut self, rewriter: Arc<dyn StackRewriter>) -> Self {
        self.stack_rewriter = rewriter;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn build(self) -> SsrModuleLoader {
        SsrModuleLoader {
            inner: Arc::new(LoaderInner {
                graph: self.graph,
                transform: self.transform,
                evaluator: self.evaluator,
                require: self.require,
                stack_rewriter: self.stack_rewriter,
                logger: self.logger,
            }),
        }
    }
}

/// Loads, evaluates and memoizes modules for server-side rendering.
///
/// Each URL is evaluated at most once while its graph entry holds a
/// namespace. Circular static imports resolve to an empty namespace for the
/// cyclic visit.
#[derive(Clone)]
pub struct SsrModuleLoader {
    inner: Arc<LoaderInner>,
}

impl SsrModuleLoader {
    pub fn builder(
        graph: Arc<dyn ModuleGraph>,
        transform: Arc<dyn TransformPipeline>,
        evaluator: Arc<dyn Evaluator>,
        require: Arc<dyn HostRequire>,
    ) -> SsrModuleLoaderBuilder {
        SsrModuleLoaderBuilder {
            graph,
            transform,
            evaluator,
            require,
            stack_rewriter: Arc::new(IdentityStackRewriter),
            logger: Arc::new(TracingLogger),
        }
    }

    #[must_use]
    pub fn graph(&self) -> &Arc<dyn ModuleGraph> {
        &self.inner.graph
    }

    pub async fn load_module(&self, url: &str) -> Result<ModuleNamespace, LoaderError> {
        self.load_with_stack(url.to_string(), Vec::new()).await
    }

    fn load_with_stack(
        &self,
        url: String,
        url_stack: Vec<String>,
    ) -> BoxFuture<'static, Result<ModuleNamespace, LoaderError>> {
        let this = self.clone();
        async move {
            let inner = &this.inner;
            if url_stack.contains(&url) {
                inner.logger.warn(
                    &format!("Circular dependency: {} -> {url}", url_stack.join(" -> ")),
                    LogOptions::default(),
                );
                return Ok(ModuleNamespace::new());
            }

            let record = inner.graph.ensure_entry(&url);
            if let Some(namespace) = record.ssr_module {
                return Ok(namespace);
            }

            let result = inner
                .transform
                .transform(&url, TransformOptions { ssr: true })
                .await
                .map_err(|source| LoaderError::Transform {
                    url: url.clone(),
                    source,
                })?
                .ok_or_else(|| LoaderError::NoTransformResult { url: url.clone() })?;

            let mut child_stack = url_stack;
            child_stack.push(url.clone());

            let static_deps = result
                .deps
                .iter()
                .filter(|dep| !is_external_dep(dep))
                .map(|dep| this.load_with_stack(dep.clone(), child_stack.clone()));
            future::try_join_all(static_deps).await?;

            let scope = SsrScope {
                loader: this.clone(),
                url: url.clone(),
                file: record.file,
                exports: ModuleNamespace::new(),
                url_stack: child_stack,
            };
            let code = format!("{}\n//# sourceURL={}", result.code, record.url);

            if let Err(err) = inner.evaluator.run(&code, &scope).await {
                let stack = inner
                    .stack_rewriter
                    .rewrite_stack(&err.stack, inner.graph.as_ref());
                inner.logger.error(
                    &format!("Error when evaluating SSR module {url}:\n{stack}"),
                    LogOptions::prominent(),
                );
            }

            let namespace = scope.exports;
            inner.graph.set_ssr_module(&url, namespace.clone());
            Ok(namespace)
        }
        .boxed()
    }
}

/// `import.meta` as seen by SSR code.
#[derive(Debug, Clone, Copy)]
pub struct ImportMeta<'a> {
    pub url: &'a str,
}

/// Hot-reload handle; never constructed during SSR.
#[derive(Debug)]
pub enum HotContext {}

impl ImportMeta<'_> {
    /// `import.meta.hot`, which SSR code cannot use.
    pub fn hot(&self) -> Result<HotContext, LoaderError> {
        Err(LoaderError::HotUnavailable)
    }
}

/// Bindings handed to the evaluator for one module.
pub struct SsrScope {
    loader: SsrModuleLoader,
    url: String,
    file: Option<PathBuf>,
    exports: ModuleNamespace,
    url_stack: Vec<String>,
}

impl SsrScope {
    /// The namespace this module's exports are written to.
    #[must_use]
    pub fn exports(&self) -> &ModuleNamespace {
        &self.exports
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn import_meta(&self) -> ImportMeta<'_> {
        ImportMeta { url: &self.url }
    }

    /// Static import. Internal deps must already be loaded; an unloaded one
    /// yields `Ok(None)`.
    pub fn ssr_import(&self, dep: &str) -> Result<Option<ModuleNamespace>, LoaderError> {
        if is_external_dep(dep) {
            return self.host_require(dep).map(Some);
        }
        Ok(self
            .loader
            .inner
            .graph
            .lookup_by_url(dep)
            .and_then(|record| record.ssr_module))
    }

    /// Dynamic `import()`. Internal deps are loaded on demand.
    pub fn ssr_dynamic_import(
        &self,
        dep: &str,
    ) -> BoxFuture<'static, Result<ModuleNamespace, LoaderError>> {
        if is_external_dep(dep) {
            return future::ready(self.host_require(dep)).boxed();
        }
        self.loader
            .load_with_stack(dep.to_string(), self.url_stack.clone())
    }

    /// `export * from source`.
    pub fn ssr_export_all(&self, source: &ModuleNamespace) {
        self.exports.export_all(source);
    }

    fn host_require(&self, specifier: &str) -> Result<ModuleNamespace, LoaderError> {
        let from_dir = self.file.as_deref().and_then(std::path::Path::parent);
        self.loader
            .inner
            .require
            .require(specifier, from_dir)
            .map(ModuleNamespace::with_default_interop)
            .map_err(|source| LoaderError::Require {
                specifier: specifier.to_string(),
                source,
            })
    }
}
