#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod dev;
pub mod error;
pub mod log;
pub mod resolver;
pub mod ssr;
pub mod version;

pub use config::{Config, ResolveOptions};
pub use dev::{load_env, DevSession, LoadedEnv, OptimizedDeps};
pub use error::{EnvError, Error, LoaderError, ResolveError};
pub use log::{LogOptions, Logger, TracingLogger};
pub use resolver::{ModuleId, ResolveContext, ResolveOutcome, ResolvePlugin, ResolvedId};
pub use ssr::{MemoryModuleGraph, ModuleGraph, ModuleNamespace, SsrModuleLoader};
pub use version::{OUTPUT_SCHEMA_VERSION, VERSION};
