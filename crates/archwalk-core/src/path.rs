//! Path normalization and joining.
//!
//! Starting points arrive as slash-delimited strings; everything the walker
//! builds afterwards goes through [`join`] so the host separator is used
//! throughout.

use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;

/// Rewrites a forward-slash delimited path into host-native form.
///
/// Paths with fewer than two segments come back unchanged. A leading `/` is
/// kept as the root, and empty segments left by repeated or trailing slashes
/// are dropped.
///
/// # Examples
///
/// ```
/// use archwalk_core::path::normalize;
/// use std::path::Path;
/// use std::path::PathBuf;
///
/// assert_eq!(normalize("src"), PathBuf::from("src"));
/// assert_eq!(normalize("a/b/c"), Path::new("a").join("b").join("c"));
/// ```
#[must_use]
pub fn normalize(path: &str) -> PathBuf {
    if !path.contains('/') {
        return PathBuf::from(path);
    }

    let mut segments = path.split('/');
    let first = segments.next().unwrap_or_default();
    let mut normalized = if first.is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(first)
    };
    for segment in segments.filter(|s| !s.is_empty()) {
        normalized.push(segment);
    }
    normalized
}

/// Joins a directory and a file name.
///
/// A missing `name` returns `dir`; a missing `dir` returns `name`. Queue
/// entries always carry at least one of the two.
///
/// # Examples
///
/// ```
/// use archwalk_core::path::join;
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// let dir = Path::new("project");
/// assert_eq!(join(Some(dir), Some(OsStr::new("Cargo.toml"))), dir.join("Cargo.toml"));
/// assert_eq!(join(Some(dir), None), dir);
/// assert_eq!(join(None, Some(OsStr::new("README"))), Path::new("README"));
/// ```
#[must_use]
pub fn join(dir: Option<&Path>, name: Option<&OsStr>) -> PathBuf {
    match (dir, name) {
        (Some(dir), Some(name)) => dir.join(name),
        (Some(dir), None) => dir.to_path_buf(),
        (None, Some(name)) => PathBuf::from(name),
        (None, None) => {
            debug_assert!(false, "join called without a directory or a name");
            PathBuf::new()
        }
    }
}
