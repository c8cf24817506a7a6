//! Server-side module loading.
//!
//! [`SsrModuleLoader`] walks a module's static imports depth-first, evaluates
//! each module once through a host [`Evaluator`] and stores the resulting
//! [`ModuleNamespace`] on the [`ModuleGraph`]. Evaluation failures are logged,
//! never returned.

pub mod graph;
pub mod host;
pub mod loader;
pub mod namespace;

pub use graph::{MemoryModuleGraph, ModuleGraph, ModuleRecord};
pub use host::{
    EvaluationError, Evaluator, HostRequire, IdentityStackRewriter, SsrTransformResult,
    StackRewriter, TransformOptions, TransformPipeline,
};
pub use loader::{HotContext, ImportMeta, SsrModuleLoader, SsrModuleLoaderBuilder, SsrScope};
pub use namespace::{ExportValue, ModuleNamespace, DEFAULT_EXPORT};
