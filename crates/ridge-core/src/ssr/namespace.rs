//! Module namespace objects produced by SSR evaluation.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

/// Key excluded from `export *`.
pub const DEFAULT_EXPORT: &str = "default";

/// Bound depth when following re-export chains.
const MAX_REEXPORT_DEPTH: usize = 64;

/// Value of one export.
#[derive(Debug, Clone)]
pub enum ExportValue {
    /// Plain data.
    Json(Value),
    /// Another module's namespace (e.g. a dynamic import result).
    Module(ModuleNamespace),
}

impl ExportValue {
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Module(_) => None,
        }
    }

    #[must_use]
    pub fn as_module(&self) -> Option<&ModuleNamespace> {
        match self {
            Self::Module(ns) => Some(ns),
            Self::Json(_) => None,
        }
    }
}

impl From<Value> for ExportValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<ModuleNamespace> for ExportValue {
    fn from(ns: ModuleNamespace) -> Self {
        Self::Module(ns)
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Value(ExportValue),
    /// Live view of `source[key]`.
    Reexport { source: ModuleNamespace, key: String },
}

#[derive(Default)]
struct Inner {
    bindings: RwLock<Vec<(String, Binding)>>,
    /// Host module wrapped for default-import interop.
    interop: Option<ModuleNamespace>,
}

/// Shared, mutable export namespace with identity.
///
/// Clones share the same bindings; [`ModuleNamespace::ptr_eq`] tells whether
/// two handles are the same module.
#[derive(Clone, Default)]
pub struct ModuleNamespace(Arc<Inner>);

impl ModuleNamespace {
    /// Empty namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a host-required module so `default` yields the module itself
    /// while other keys read through to it.
    #[must_use]
    pub fn with_default_interop(module: ModuleNamespace) -> Self {
        Self(Arc::new(Inner {
            bindings: RwLock::new(Vec::new()),
            interop: Some(module),
        }))
    }

    /// Whether both handles point at the same namespace.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Current value of `key`, following live re-exports.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ExportValue> {
        self.get_at_depth(key, 0)
    }

    fn get_at_depth(&self, key: &str, depth: usize) -> Option<ExportValue> {
        if depth > MAX_REEXPORT_DEPTH {
            return None;
        }
        if let Some(module) = &self.0.interop {
            if key == DEFAULT_EXPORT {
                return Some(ExportValue::Module(module.clone()));
            }
            return module.get_at_depth(key, depth + 1);
        }

        // the lock is released before following a re-export
        let binding = self
            .0
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, b)| b.clone())?;
        match binding {
            Binding::Value(value) => Some(value),
            Binding::Reexport { source, key } => source.get_at_depth(&key, depth + 1),
        }
    }

    /// Bind `key` to `value`, replacing any existing binding.
    pub fn set(&self, key: impl Into<String>, value: impl Into<ExportValue>) {
        self.bind(key.into(), Binding::Value(value.into()), true);
    }

    fn bind(&self, key: String, binding: Binding, replace: bool) {
        let mut bindings = self
            .0
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match bindings.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) if replace => slot.1 = binding,
            Some(_) => {}
            None => bindings.push((key, binding)),
        }
    }

    /// Exported names in definition order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        if let Some(module) = &self.0.interop {
            let mut keys = module.keys();
            if !keys.iter().any(|k| k == DEFAULT_EXPORT) {
                keys.push(DEFAULT_EXPORT.to_string());
            }
            return keys;
        }
        self.0
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `export * from source`: bind every key except `default` as a live
    /// view of `source`. Names this module already defines are kept.
    pub fn export_all(&self, source: &ModuleNamespace) {
        if self.ptr_eq(source) {
            return;
        }
        for key in source.keys() {
            if key == DEFAULT_EXPORT {
                continue;
            }
            self.bind(
                key.clone(),
                Binding::Reexport {
                    source: source.clone(),
                    key,
                },
                false,
            );
        }
    }
}

impl fmt::Debug for ModuleNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleNamespace")
            .field("keys", &self.keys())
            .field("interop", &self.0.interop.is_some())
            .finish()
    }
}
