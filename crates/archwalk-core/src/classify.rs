//! Entry classification.

use std::fs;
use std::path::Path;

use crate::formats::ArchiveHandle;
use crate::formats::probe;

/// What a queued path is on disk, with symlinks resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symlink whose target cannot be resolved.
    Symlink,
    /// Regular file that probed as a supported archive.
    Archive(ArchiveHandle),
    /// Exists, but is neither a regular file nor a directory.
    Other,
    /// Nothing exists at the path.
    Missing,
}

/// Classifies `path`.
///
/// Archives are only probed for when `probe_archives` is set, and only for
/// regular files. A failed probe classifies the file as [`Kind::File`].
#[must_use]
pub fn classify(path: &Path, probe_archives: bool) -> Kind {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Kind::Directory,
        Ok(meta) if meta.is_file() => {
            if probe_archives && let Some(handle) = probe(path) {
                Kind::Archive(handle)
            } else {
                Kind::File
            }
        }
        Ok(_) => Kind::Other,
        Err(_) if is_symlink(path) => Kind::Symlink,
        Err(_) => Kind::Missing,
    }
}

/// Returns `true` if `path` itself is a symbolic link.
///
/// Always `false` where the platform has no symlinks or the path cannot be
/// inspected.
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
}
