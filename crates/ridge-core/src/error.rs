use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by external collaborators (transform pipeline, host require).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for ridge operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Fatal resolution errors.
///
/// Soft misses (file not found, browser-field no-match) are not errors: they
/// surface as `ResolveOutcome::NotApplicable` so later strategies can run.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Deep import into a dependency that the active dev session pre-bundled.
    #[error(
        "Deep import \"{id}\" should be avoided because dependency \"{package}\" has been pre-optimized. \
         Prefer importing directly from the module entry:\n\n  import {{ ... }} from \"{package}\"\n\n\
         If the used import is not exported from the package's main entry and can only be attained \
         via deep import, you can explicitly add the deep import path to \"optimizeDeps.include\"."
    )]
    DeepImportOptimized { id: String, package: String },

    /// The package manifest points at an entry that does not exist.
    #[error(
        "Failed to resolve entry for package \"{package}\". The package may have incorrect \
         main/module/exports specified in its package.json."
    )]
    PackageEntryNotFound { package: String },

    /// The package declares `exports` and the requested subpath is not among them.
    #[error("Package subpath '{subpath}' is not defined by \"exports\" in {manifest}.")]
    SubpathNotExported { subpath: String, manifest: PathBuf },

    /// An `exports` target was matched but the file it names is missing.
    #[error(
        "Package subpath '{subpath}' maps to '{target}' in {manifest}, but that file does not exist."
    )]
    ExportedFileNotFound {
        subpath: String,
        target: String,
        manifest: PathBuf,
    },

    #[error("Failed to read package manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse package manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ResolveError {
    /// Whether this error reports a caller mistake rather than a broken package.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::DeepImportOptimized { .. })
    }
}

/// Errors raised while loading modules for server-side rendering.
///
/// Evaluation errors are deliberately absent: they are logged by the loader
/// and never surface to the caller.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to load module for ssr: {url}")]
    NoTransformResult { url: String },

    #[error("failed to transform {url} for ssr: {source}")]
    Transform {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to require \"{specifier}\": {source}")]
    Require {
        specifier: String,
        #[source]
        source: BoxError,
    },

    #[error("import.meta.hot is not available in code targeting SSR.")]
    HotUnavailable,
}

/// Errors from env-file loading.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvError {
    #[error(
        "\"local\" cannot be used as a mode name because it conflicts with the .local postfix for .env files."
    )]
    ReservedMode,

    #[error(
        "envPrefix option contains value '', which could lead unexpected exposure of sensitive information."
    )]
    EmptyPrefix,
}
