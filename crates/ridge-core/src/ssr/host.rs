//! Capabilities the SSR loader borrows from its host.
//!
//! Transforming source, executing it and requiring external packages are all
//! host-specific. The loader only schedules and caches around these traits.

use std::path::Path;

use futures::future::BoxFuture;
use thiserror::Error;

use super::graph::ModuleGraph;
use super::loader::SsrScope;
use super::namespace::ModuleNamespace;
use crate::error::BoxError;

/// Flags passed to the transform pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub ssr: bool,
}

/// Transformed module ready for evaluation.
#[derive(Debug, Clone, Default)]
pub struct SsrTransformResult {
    pub code: String,
    /// Static import specifiers, in source order.
    pub deps: Vec<String>,
}

impl SsrTransformResult {
    #[must_use]
    pub fn new(code: impl Into<String>, deps: Vec<String>) -> Self {
        Self {
            code: code.into(),
            deps,
        }
    }
}

pub trait TransformPipeline: Send + Sync {
    /// `Ok(None)` means the pipeline produced nothing for `url`.
    fn transform<'a>(
        &'a self,
        url: &'a str,
        options: TransformOptions,
    ) -> BoxFuture<'a, Result<Option<SsrTransformResult>, BoxError>>;
}

/// Failure thrown by module code while it runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EvaluationError {
    pub message: String,
    pub stack: String,
}

impl EvaluationError {
    #[must_use]
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }
}

/// Executes transformed code against an [`SsrScope`].
///
/// Exports are written to `scope.exports()` as the code runs, so a failing
/// run still leaves whatever it defined before the error.
pub trait Evaluator: Send + Sync {
    fn run<'a>(
        &'a self,
        code: &'a str,
        scope: &'a SsrScope,
    ) -> BoxFuture<'a, Result<(), EvaluationError>>;
}

/// Node-style `require` for packages the loader does not evaluate itself.
pub trait HostRequire: Send + Sync {
    /// Resolve `specifier` upward from `from_dir`, or from the process
    /// working directory when the importer has no file.
    fn require(
        &self,
        specifier: &str,
        from_dir: Option<&Path>,
    ) -> Result<ModuleNamespace, BoxError>;
}

/// Maps generated-code stack frames back to original sources.
pub trait StackRewriter: Send + Sync {
    fn rewrite_stack(&self, stack: &str, graph: &dyn ModuleGraph) -> String;
}

/// Returns stacks unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStackRewriter;

impl StackRewriter for IdentityStackRewriter {
    fn rewrite_stack(&self, stack: &str, _graph: &dyn ModuleGraph) -> String {
        stack.to_string()
    }
}
