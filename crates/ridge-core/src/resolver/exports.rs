//! Conditional `exports` evaluation.
//!
//! Supports:
//! - String shorthand (`"exports": "./index.js"`)
//! - Fallback arrays (first entry that resolves wins)
//! - Subpath maps with exact keys, `*` patterns and legacy `./dir/` keys
//! - Condition maps, evaluated in declaration order with `require`/`default`
//!   held back until no recognized condition matched
//!
//! Manifest JSON is read with `preserve_order`, so map order is declaration order.

use serde_json::Value;

/// Conditions always accepted, but only after every other key was considered.
pub const FALLBACK_CONDITIONS: &[&str] = &["require", "default"];

/// Classified `exports` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportsEntry {
    /// A relative target path.
    Target(String),
    /// Alternatives tried in order.
    Fallbacks(Vec<ExportsEntry>),
    /// Keys starting with `.`, mapping subpaths to entries.
    SubpathMap(Vec<(String, ExportsEntry)>),
    /// Condition names mapping to entries.
    ConditionMap(Vec<(String, ExportsEntry)>),
    /// `null` or any other non-target value: explicitly not exported.
    Null,
}

impl ExportsEntry {
    /// Classify a raw manifest value.
    ///
    /// An object is a subpath map when any of its keys starts with `.`;
    /// non-dot keys in such a map are ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Target(s.clone()),
            Value::Array(items) => Self::Fallbacks(items.iter().map(Self::from_value).collect()),
            Value::Object(map) => {
                let is_subpath_map = map.keys().any(|k| k.starts_with('.'));
                let entries = map
                    .iter()
                    .filter(|(k, _)| !is_subpath_map || k.starts_with('.'))
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect();
                if is_subpath_map {
                    Self::SubpathMap(entries)
                } else {
                    Self::ConditionMap(entries)
                }
            }
            _ => Self::Null,
        }
    }

    /// String or array `exports`: only the package root is exposed.
    #[must_use]
    pub fn is_root_only(&self) -> bool {
        matches!(self, Self::Target(_) | Self::Fallbacks(_))
    }
}

/// Resolve `subpath` (`.` or `./x`) against an `exports` entry.
///
/// A non-map entry is shorthand for `{ ".": entry }`. Returns the target
/// relative to the package root, or `None` when the subpath is not exported
/// under the given conditions.
#[must_use]
pub fn resolve_exports(
    entry: &ExportsEntry,
    subpath: &str,
    conditions: &[String],
) -> Option<String> {
    match entry {
        ExportsEntry::SubpathMap(map) => resolve_subpath(map, subpath, conditions),
        _ if subpath == "." => resolve_target(entry, conditions),
        _ => None,
    }
}

fn resolve_subpath(
    map: &[(String, ExportsEntry)],
    subpath: &str,
    conditions: &[String],
) -> Option<String> {
    if let Some((_, target)) = map.iter().find(|(key, _)| key == subpath) {
        return resolve_target(target, conditions);
    }

    // Longest matching pattern or directory key wins
    let mut best: Option<(&str, &ExportsEntry)> = None;
    for (key, target) in map {
        let matches = if key.contains('*') {
            match_pattern(key, subpath).is_some()
        } else {
            key.ends_with('/') && subpath.starts_with(key.as_str())
        };
        if matches && best.map_or(true, |(b, _)| key.len() > b.len()) {
            best = Some((key, target));
        }
    }

    let (key, target) = best?;
    let resolved = resolve_target(target, conditions)?;
    if key.contains('*') {
        let star = match_pattern(key, subpath)?;
        substitute_star(&resolved, &star)
    } else {
        // ./dir/ -> ./lib/ rewrites the prefix
        let rest = &subpath[key.len()..];
        if !resolved.ends_with('/') || rest.split('/').any(|seg| seg == "..") {
            return None;
        }
        Some(format!("{resolved}{rest}"))
    }
}

fn resolve_target(entry: &ExportsEntry, conditions: &[String]) -> Option<String> {
    match entry {
        ExportsEntry::Target(s) => Some(s.clone()),
        ExportsEntry::Fallbacks(items) => {
            items.iter().find_map(|item| resolve_target(item, conditions))
        }
        ExportsEntry::ConditionMap(map) => resolve_conditions(map, conditions),
        ExportsEntry::SubpathMap(_) | ExportsEntry::Null => None,
    }
}

/// Evaluate a condition map in declaration order.
///
/// The first recognized condition that resolves wins. `require` and `default`
/// are remembered on the way and only tried once the map is exhausted, so
/// `{ require, module, default }` picks `module`. Unknown keys are skipped.
fn resolve_conditions(map: &[(String, ExportsEntry)], conditions: &[String]) -> Option<String> {
    let mut fallbacks: Vec<&ExportsEntry> = Vec::new();
    for (key, target) in map {
        if FALLBACK_CONDITIONS.contains(&key.as_str()) {
            fallbacks.push(target);
        } else if conditions.iter().any(|c| c == key) {
            if let Some(resolved) = resolve_target(target, conditions) {
                return Some(resolved);
            }
        }
    }
    fallbacks
        .into_iter()
        .find_map(|target| resolve_target(target, conditions))
}

/// Match `subpath` against a pattern key containing one `*`.
///
/// Returns the text matched by `*`, which must be non-empty.
fn match_pattern(pattern: &str, subpath: &str) -> Option<String> {
    let star_pos = pattern.find('*')?;
    let prefix = &pattern[..star_pos];
    let suffix = &pattern[star_pos + 1..];

    if !subpath.starts_with(prefix) || !subpath.ends_with(suffix) {
        return None;
    }

    let start = prefix.len();
    let end = subpath.len() - suffix.len();
    if start >= end {
        return None;
    }
    Some(subpath[start..end].to_string())
}

/// Substitute `*` in a target with the matched text.
///
/// Rejects targets without exactly one `*` and results that traverse with `..`.
fn substitute_star(target: &str, star_value: &str) -> Option<String> {
    if target.matches('*').count() != 1 {
        return None;
    }
    let result = target.replace('*', star_value);
    if result.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(result)
}
