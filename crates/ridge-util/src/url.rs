//! Query-string handling for module ids.
//!
//! Module ids are file paths that may carry a `?query` (and, for URLs, a
//! `#hash`). Resolution works on the path part and re-appends the rest verbatim.

/// Split an id into its path and `?query` parts.
///
/// The query part keeps its leading `?`; an empty query (`a.js?`) is dropped.
#[must_use]
pub fn split_query(id: &str) -> (&str, &str) {
    match id.find('?') {
        Some(i) if i + 1 < id.len() => (&id[..i], &id[i..]),
        Some(i) => (&id[..i], ""),
        None => (id, ""),
    }
}

/// Inject `query` as the first query parameter of `url`.
///
/// Existing parameters follow it and a trailing `#hash` is preserved:
/// `inject_query("/a.js?x=1#top", "v=abc")` yields `/a.js?v=abc&x=1#top`.
#[must_use]
pub fn inject_query(url: &str, query: &str) -> String {
    let (rest, hash) = match url.find('#') {
        Some(i) => (&url[..i], &url[i..]),
        None => (url, ""),
    };
    let (path, search) = split_query(rest);
    let mut out = String::with_capacity(url.len() + query.len() + 2);
    out.push_str(path);
    out.push('?');
    out.push_str(query);
    if !search.is_empty() {
        out.push('&');
        out.push_str(&search[1..]);
    }
    out.push_str(hash);
    out
}
