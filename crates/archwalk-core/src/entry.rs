//! Values handed to hooks and yielded by walkers.

use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use crate::formats::ArchiveType;
use crate::origin::OriginId;

/// The `{dir, name, path}` triple describing an entry to filters and sort
/// comparators.
///
/// For entries found while listing a directory both `dir` and `name` are
/// set. A starting-point directory has no `name`; a starting point that is
/// not a directory has no `dir` and its `name` is the path as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    /// Directory the entry was found in.
    pub dir: Option<&'a Path>,
    /// Bare name of the entry inside `dir`.
    pub name: Option<&'a OsStr>,
    /// Full path at which the entry currently exists on disk.
    pub path: &'a Path,
}

impl<'a> Candidate<'a> {
    /// Returns the last component of the entry, whichever way it was queued.
    ///
    /// # Examples
    ///
    /// ```
    /// use archwalk_core::Candidate;
    /// use std::ffi::OsStr;
    /// use std::path::Path;
    ///
    /// let start = Candidate {
    ///     dir: Some(Path::new("src/.svn")),
    ///     name: None,
    ///     path: Path::new("src/.svn"),
    /// };
    /// assert_eq!(start.file_name(), Some(OsStr::new(".svn")));
    /// ```
    #[must_use]
    pub fn file_name(&self) -> Option<&'a OsStr> {
        match self.name {
            Some(name) if self.dir.is_some() => Some(name),
            _ => self.path.file_name(),
        }
    }
}

/// One unit of pending work in a walker's queue.
#[derive(Debug)]
pub(crate) struct QueueEntry {
    pub(crate) dir: Option<PathBuf>,
    pub(crate) name: Option<OsString>,
    pub(crate) path: PathBuf,
    pub(crate) origin: Option<OriginId>,
}

impl QueueEntry {
    /// Queues a caller-supplied starting point.
    pub(crate) fn starting_point(path: PathBuf) -> Self {
        if path.is_dir() {
            Self {
                dir: Some(path.clone()),
                name: None,
                path,
                origin: None,
            }
        } else {
            Self {
                dir: None,
                name: Some(path.clone().into_os_string()),
                path,
                origin: None,
            }
        }
    }

    /// Queues an entry found while listing `dir`.
    pub(crate) fn child(
        dir: &Path,
        name: OsString,
        path: PathBuf,
        origin: Option<OriginId>,
    ) -> Self {
        Self {
            dir: Some(dir.to_path_buf()),
            name: Some(name),
            path,
            origin,
        }
    }

    pub(crate) fn candidate(&self) -> Candidate<'_> {
        Candidate {
            dir: self.dir.as_deref(),
            name: self.name.as_deref(),
            path: &self.path,
        }
    }
}

/// What a yielded entry turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Archive that was expanded like a directory.
    Archive(ArchiveType),
    /// Symbolic link whose target does not exist.
    Symlink,
    /// Socket, FIFO, device node or anything else that is neither a file nor
    /// a directory.
    Other,
}

/// An entry yielded by a [`Walker`](crate::Walker).
///
/// `path` is where the entry can be opened right now; for entries inside an
/// expanded archive that is somewhere in a temporary directory, valid until
/// the walker is advanced past the archive. `logical_path` is the path shown
/// to users, with archive contents nested under the archive's own path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    dir: Option<PathBuf>,
    name: Option<OsString>,
    path: PathBuf,
    logical_path: PathBuf,
    entry_type: EntryType,
}

impl Entry {
    pub(crate) fn new(queued: &QueueEntry, logical_path: PathBuf, entry_type: EntryType) -> Self {
        Self {
            dir: queued.dir.clone(),
            name: queued.name.clone(),
            path: queued.path.clone(),
            logical_path,
            entry_type,
        }
    }

    /// Directory the entry was found in, if it was not a starting point.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Bare name of the entry, if any.
    #[must_use]
    pub fn name(&self) -> Option<&OsStr> {
        self.name.as_deref()
    }

    /// Real path of the entry on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Caller-visible path of the entry.
    #[must_use]
    pub fn logical_path(&self) -> &Path {
        &self.logical_path
    }

    /// What the entry is.
    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Returns `true` if the entry lives inside an expanded archive.
    #[must_use]
    pub fn is_from_archive(&self) -> bool {
        self.path != self.logical_path
    }

    /// Consumes the entry, returning its logical path.
    #[must_use]
    pub fn into_logical_path(self) -> PathBuf {
        self.logical_path
    }

    /// Consumes the entry, returning `(dir, name, real path, logical path)`.
    #[must_use]
    pub fn into_parts(self) -> (Option<PathBuf>, Option<OsString>, PathBuf, PathBuf) {
        (self.dir, self.name, self.path, self.logical_path)
    }
}
