//! Specifier classification.
//!
//! A specifier falls into exactly one [`SpecifierKind`]. The checks run in a
//! fixed priority order, so `/@fs/x` is an fs escape rather than root-relative
//! and `//cdn/x` is an external URL unless source-serving claims it first.

use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;

/// Prefix of explicit filesystem paths served outside the project root.
pub const FS_PREFIX: &str = "/@fs/";

/// Id of the synthetic empty module.
pub const BROWSER_EXTERNAL_ID: &str = "__browser-external";

/// Source text served for [`BROWSER_EXTERNAL_ID`].
pub const BROWSER_EXTERNAL_CODE: &str = "export default {}";

/// Syntactic category of a specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `/@fs/<abs path>`; only recognized when source-serving.
    FsEscape,
    /// `/foo` resolved against the project root; only when source-serving.
    RootRelative,
    /// Starts with `.`.
    Relative,
    /// An absolute host path.
    Absolute,
    /// `http://`, `https://` or protocol-relative `//`.
    ExternalUrl,
    /// `data:` URL.
    DataUrl,
    /// Package specifier such as `react` or `@scope/pkg/sub`.
    Bare,
    /// None of the above (e.g. `#internal`, `virtual:x`).
    Unknown,
}

/// Classify `id`.
#[must_use]
pub fn classify(id: &str, as_src: bool) -> SpecifierKind {
    if as_src && id.starts_with(FS_PREFIX) {
        SpecifierKind::FsEscape
    } else if as_src && id.starts_with('/') {
        SpecifierKind::RootRelative
    } else if id.starts_with('.') {
        SpecifierKind::Relative
    } else if Path::new(id).is_absolute() && !is_external_url(id) {
        SpecifierKind::Absolute
    } else if is_external_url(id) {
        SpecifierKind::ExternalUrl
    } else if is_data_url(id) {
        SpecifierKind::DataUrl
    } else if is_bare_import(id) {
        SpecifierKind::Bare
    } else {
        SpecifierKind::Unknown
    }
}

/// `http://`, `https://` or `//` prefixed.
#[must_use]
pub fn is_external_url(id: &str) -> bool {
    id.starts_with("//") || id.starts_with("http://") || id.starts_with("https://")
}

/// `data:` URL, ignoring case and leading whitespace.
#[must_use]
pub fn is_data_url(id: &str) -> bool {
    let trimmed = id.trim_start();
    trimmed
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Starts with a word character or `@` and carries no `://` scheme.
#[must_use]
pub fn is_bare_import(id: &str) -> bool {
    let Some(first) = id.chars().next() else {
        return false;
    };
    (first == '@' || first == '_' || first.is_ascii_alphanumeric()) && !id.contains("://")
}

/// Split a bare specifier into its package id and, for deep imports, the
/// remainder after the package id.
///
/// `lodash/get` yields `("lodash", Some("/get"))`; `@vue/shared/dist/x`
/// yields `("@vue/shared", Some("/dist/x"))`; `react` yields `("react", None)`.
#[must_use]
pub fn split_package_id(id: &str) -> (&str, Option<&str>) {
    let name_end = if id.starts_with('@') {
        // scope/name: the second slash ends the package id
        match id.find('/') {
            Some(first) => id[first + 1..].find('/').map(|second| first + 1 + second),
            None => None,
        }
    } else {
        id.find('/')
    };

    match name_end {
        Some(end) if end > 0 => (&id[..end], Some(&id[end..])),
        _ => (id, None),
    }
}

/// The `?commonjs` proxy ids and helpers produced by the commonjs plugin.
#[must_use]
pub fn is_commonjs_proxy(id: &str) -> bool {
    id.contains("?commonjs") || id == "commonjsHelpers.js"
}

fn css_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.(css|less|sass|scss|styl|stylus|postcss)($|\?)").ok())
        .as_ref()
}

/// Stylesheet request, optionally followed by a query.
#[must_use]
pub fn is_css_request(id: &str) -> bool {
    css_re().is_some_and(|re| re.is_match(id))
}

/// Convert a `/@fs/` id into the filesystem path it names.
#[must_use]
pub fn fs_path_from_id(id: &str) -> String {
    let rest = id.strip_prefix(FS_PREFIX).unwrap_or(id);
    let rest = ridge_util::path::slash(rest);
    if Path::new(&rest).is_absolute() {
        rest
    } else {
        format!("/{rest}")
    }
}
