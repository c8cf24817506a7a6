use std::fs;
use std::io;
use std::path::Path;

/// What a path points at on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Stat a path, following symlinks.
///
/// Returns `None` when nothing exists at `path` (or it cannot be stat'ed).
#[must_use]
pub fn entry_kind(path: &Path) -> Option<EntryKind> {
    let meta = fs::metadata(path).ok()?;
    if meta.is_dir() {
        Some(EntryKind::Dir)
    } else {
        Some(EntryKind::File)
    }
}

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
