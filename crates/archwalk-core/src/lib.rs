//! Lazy, depth-first directory traversal that can descend into archives.
//!
//! `archwalk-core` walks one or more starting paths and yields files,
//! directories, or both, one entry per call to `next()`. Which directories
//! are entered, which entries are yielded and in what order siblings come
//! out are all decided by caller-supplied hooks on [`TraversalOptions`].
//!
//! With [`TraversalOptions::expand_archives`] set, tar, zip and 7z archives
//! (and single compressed files) are unpacked into temporary directories and
//! walked as if they were directories. Entries found inside are reported
//! under the archive's own path, e.g. `data/ddd.tar.gz/ccc/bbb.tar.gz/aaa`.
//!
//! # Examples
//!
//! ```no_run
//! use archwalk_core::ErrorAction;
//! use archwalk_core::SortOrder;
//! use archwalk_core::TraversalOptions;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = TraversalOptions::default()
//!     .with_descend_filter(|c| c.file_name().is_none_or(|name| name != ".svn"))
//!     .with_error_handler(|err| {
//!         eprintln!("skipping: {err}");
//!         ErrorAction::Continue
//!     })
//!     .with_sort_files(SortOrder::Standard)
//!     .with_expand_archives(true);
//!
//! for entry in archwalk_core::files(options, ["/srv/data"]) {
//!     let entry = entry?;
//!     println!("{}", entry.logical_path().display());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod entry;
pub mod error;
pub(crate) mod expand;
pub mod formats;
pub mod origin;
pub mod path;
pub mod walker;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use config::SortOrder;
pub use config::TraversalOptions;
pub use entry::Candidate;
pub use entry::Entry;
pub use entry::EntryType;
pub use error::ErrorAction;
pub use error::Result;
pub use error::WalkError;
pub use formats::ArchiveType;
pub use formats::CompressionCodec;
pub use walker::Flavor;
pub use walker::Walker;

// Re-export factories for easier access
pub use walker::dirs;
pub use walker::dirs_with_settings;
pub use walker::everything;
pub use walker::everything_with_settings;
pub use walker::files;
pub use walker::files_with_settings;
