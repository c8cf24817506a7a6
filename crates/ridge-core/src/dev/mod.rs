//! Dev-server state consumed by the resolver and the env loader.

pub mod env;
pub mod session;

pub use env::{load_env, resolve_env_prefix, LoadedEnv, DEFAULT_ENV_PREFIX};
pub use session::{DevSession, OptimizedDeps};
