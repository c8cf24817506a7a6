//! Lexical path helpers.
//!
//! None of these touch the filesystem: `.` and `..` are folded textually and
//! symlinks are left alone, so resolved ids stay stable for a given layout.

use std::path::{Component, Path, PathBuf};

/// Replace Windows separators with forward slashes.
#[must_use]
pub fn slash(path: &str) -> String {
    path.replace('\\', "/")
}

/// Fold `.` and `..` components without consulting the filesystem.
///
/// `..` above the root is dropped (`/a/../../b` becomes `/b`); `..` at the
/// start of a relative path is kept.
#[must_use]
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Join `rel` onto `base` like `path.resolve(base, rel)`.
///
/// An absolute `rel` replaces `base` entirely.
#[must_use]
pub fn resolve(base: &Path, rel: &str) -> PathBuf {
    clean(&base.join(rel))
}

/// Render a path as a normalized forward-slash string.
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    slash(&clean(path).to_string_lossy())
}

/// POSIX-style normalization of a slash-separated string.
///
/// Mirrors `path.posix.normalize`: `./a.js` becomes `a.js`, a leading `/`
/// and a trailing `/` are preserved, and an empty result is `.`.
#[must_use]
pub fn normalize_posix(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let mut out = parts.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if out.is_empty() {
        out.push('.');
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Extension of the last segment, including the dot (`""` when absent).
///
/// Follows `path.extname`: a leading dot (`.eslintrc`) is not an extension.
#[must_use]
pub fn extname(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rfind('.') {
        Some(0) | None => "",
        Some(i) => &base[i..],
    }
}

/// Relative path from directory `from` to `to`, slash-separated.
///
/// Both inputs are cleaned first; the result never starts with `./`.
#[must_use]
pub fn relative(from: &Path, to: &Path) -> String {
    let from = clean(from);
    let to = clean(to);
    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_parts.len() {
        segments.push("..".to_string());
    }
    for comp in &to_parts[common..] {
        segments.push(comp.as_os_str().to_string_lossy().into_owned());
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_folds_dots() {
        assert_eq!(clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(clean(Path::new("../x/./y")), PathBuf::from("../x/y"));
        assert_eq!(clean(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve(Path::new("/proj/src"), "../lib/a.js"),
            PathBuf::from("/proj/lib/a.js")
        );
        assert_eq!(resolve(Path::new("/proj"), "/abs/b"), PathBuf::from("/abs/b"));
    }

    #[test]
    fn test_normalize_posix() {
        assert_eq!(normalize_posix("./a.js"), "a.js");
        assert_eq!(normalize_posix("./lib/../a.js"), "a.js");
        assert_eq!(normalize_posix("../a"), "../a");
        assert_eq!(normalize_posix("/x/./y/"), "/x/y/");
        assert_eq!(normalize_posix("./"), "./");
        assert_eq!(normalize_posix(""), ".");
    }

    #[test]
    fn test_extname() {
        assert_eq!(extname("./a.js"), ".js");
        assert_eq!(extname("./a"), "");
        assert_eq!(extname("./dir.v2/file"), "");
        assert_eq!(extname(".eslintrc"), "");
        assert_eq!(extname("pkg/index.d.ts"), ".ts");
    }

    #[test]
    fn test_relative() {
        assert_eq!(
            relative(
                Path::new("/proj/node_modules/pkg"),
                Path::new("/proj/node_modules/pkg/lib/a.js")
            ),
            "lib/a.js"
        );
        assert_eq!(
            relative(Path::new("/proj/node_modules/pkg"), Path::new("/proj/src/a.js")),
            "../../src/a.js"
        );
        assert_eq!(relative(Path::new("/a"), Path::new("/a")), "");
    }
}
