//! `browser` field remapping.

use ridge_util::path::{extname, normalize_posix};
use serde_json::Value;

/// Right-hand side of a browser-map entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserTarget {
    /// Replacement path relative to the package root (or a package name).
    Path(String),
    /// `false`: the module is stubbed out.
    Excluded,
}

/// Classified `browser` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserField {
    /// `"browser": "./dist/browser.js"`
    Entry(String),
    /// `"browser": { "./a.js": "./b.js", "./c.js": false }`
    Map(Vec<(String, BrowserTarget)>),
}

impl BrowserField {
    /// Classify a raw manifest value; other shapes are ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Entry(s.clone())),
            Value::Object(map) => {
                let entries = map
                    .iter()
                    .filter_map(|(k, v)| {
                        let target = match v {
                            Value::String(s) => BrowserTarget::Path(s.clone()),
                            Value::Bool(false) => BrowserTarget::Excluded,
                            _ => return None,
                        };
                        Some((k.clone(), target))
                    })
                    .collect();
                Some(Self::Map(entries))
            }
            _ => None,
        }
    }

    /// The table, when the field is map-shaped.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(String, BrowserTarget)]> {
        match self {
            Self::Map(map) => Some(map),
            Self::Entry(_) => None,
        }
    }

    /// Browser entry point: the string form, or the map's `.` key.
    #[must_use]
    pub fn entry(&self) -> Option<&str> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Map(map) => map.iter().find_map(|(k, v)| match v {
                BrowserTarget::Path(p) if k == "." => Some(p.as_str()),
                _ => None,
            }),
        }
    }
}

/// Map a package-relative path through a browser table.
///
/// Keys and the lookup path are compared after appending `.js` to
/// extensionless paths and POSIX normalization, so `./a` finds `./a.js`.
/// No matching key returns the input unchanged.
#[must_use]
pub fn map_with_browser_field(relative: &str, map: &[(String, BrowserTarget)]) -> BrowserTarget {
    let normalized = normalize(relative);
    map.iter()
        .find(|(from, _)| normalize(from) == normalized)
        .map_or_else(|| BrowserTarget::Path(relative.to_string()), |(_, to)| to.clone())
}

fn normalize(file: &str) -> String {
    if extname(file).is_empty() {
        normalize_posix(&format!("{file}.js"))
    } else {
        normalize_posix(file)
    }
}
