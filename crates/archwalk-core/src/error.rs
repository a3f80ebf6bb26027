//! Error types for tree traversal.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `WalkError`.
pub type Result<T> = std::result::Result<T, WalkError>;

/// What a traversal should do after its error handler has seen an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Record nothing further and keep walking the rest of the queue.
    Continue,
    /// Stop the traversal. The walker yields the error and is exhausted.
    Abort,
}

/// Errors that can occur while walking a tree.
#[derive(Error, Debug)]
pub enum WalkError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory could not be opened for listing.
    #[error("cannot read directory {}: {source}", path.display())]
    ReadDir {
        /// The directory that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A single entry of a directory listing could not be read.
    #[error("cannot read entry in {}: {source}", path.display())]
    ReadEntry {
        /// The directory being listed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A queued path no longer exists.
    #[error("no such file or directory: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An archive could not be extracted.
    #[error("cannot extract {}: {reason}", path.display())]
    Extraction {
        /// Logical path of the archive.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The temporary extraction directory could not be created.
    #[error("cannot create temporary directory: {0}")]
    TempDir(std::io::Error),

    /// A symlink inside an expanded archive resolves outside the archive's
    /// extraction directory.
    #[error("symlink target outside extraction directory: {}", path.display())]
    SymlinkEscape {
        /// Logical path of the symlink.
        path: PathBuf,
    },

    /// A configuration key was not recognized, or its value had the wrong
    /// type.
    #[error("invalid option '{option}' for {operation}()")]
    InvalidOption {
        /// The offending key.
        option: String,
        /// The factory operation the key was passed to.
        operation: &'static str,
    },

    /// Archive format is unsupported or unrecognized.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// Archive is corrupted or invalid.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),
}

impl WalkError {
    /// Returns the filesystem path this error concerns, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use archwalk_core::WalkError;
    /// use std::path::Path;
    /// use std::path::PathBuf;
    ///
    /// let err = WalkError::NotFound {
    ///     path: PathBuf::from("gone.txt"),
    /// };
    /// assert_eq!(err.path(), Some(Path::new("gone.txt")));
    ///
    /// let err = WalkError::UnsupportedFormat;
    /// assert_eq!(err.path(), None);
    /// ```
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ReadDir { path, .. }
            | Self::ReadEntry { path, .. }
            | Self::NotFound { path }
            | Self::SymlinkEscape { path }
            | Self::Extraction { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns `true` if this error came from a filesystem operation rather
    /// than from configuration or archive decoding.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::ReadDir { .. }
                | Self::ReadEntry { .. }
                | Self::NotFound { .. }
                | Self::TempDir(_)
        )
    }
}
