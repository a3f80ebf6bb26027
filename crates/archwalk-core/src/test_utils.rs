//! Test utilities for building trees and archives on disk.
//!
//! Only compiled for unit tests or with the `test-utils` feature.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::fs;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// Creates an in-memory TAR archive from a list of `(path, content)` entries.
///
/// Files are created with mode 0o644.
///
/// # Examples
///
/// ```
/// use archwalk_core::test_utils::create_test_tar;
///
/// let tar_data = create_test_tar(&[("file.txt", "hello"), ("dir/nested.txt", "world")]);
/// ```
#[must_use]
pub fn create_test_tar<D: AsRef<[u8]>>(entries: &[(&str, D)]) -> Vec<u8> {
    let mut builder = TarTestBuilder::new();
    for (path, data) in entries {
        builder = builder.add_file(path, data.as_ref());
    }
    builder.build()
}

/// Creates an in-memory ZIP archive from a list of `(path, content)` entries.
///
/// Entries are stored uncompressed.
///
/// # Examples
///
/// ```
/// use archwalk_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(&[("file.txt", "hello")]);
/// ```
#[must_use]
pub fn create_test_zip<D: AsRef<[u8]>>(entries: &[(&str, D)]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::write::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    for (path, data) in entries {
        zip.start_file(*path, options).unwrap();
        zip.write_all(data.as_ref()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Gzip-compresses `data`.
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builder for TAR test archives with directories and symlinks.
///
/// # Examples
///
/// ```
/// use archwalk_core::test_utils::TarTestBuilder;
///
/// let tar_data = TarTestBuilder::new()
///     .add_directory("dir/")
///     .add_file("dir/file.txt", b"content")
///     .add_symlink("link", "dir/file.txt")
///     .build();
/// ```
pub struct TarTestBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl TarTestBuilder {
    /// Creates a new TAR test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Adds a regular file to the archive.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a directory to the archive.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Adds a symlink to the archive.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o777);
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .unwrap();
        self
    }

    /// Builds and returns the TAR archive data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

impl Default for TarTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates files and directories under `root`.
///
/// Paths ending in `/` become directories, everything else a file with the
/// given content. Parent directories are created as needed.
///
/// # Examples
///
/// ```
/// use archwalk_core::test_utils::write_tree;
/// use tempfile::TempDir;
///
/// let temp = TempDir::new().unwrap();
/// write_tree(temp.path(), &[("a.txt", "a"), ("sub/", ""), ("sub/b.txt", "b")]);
/// assert!(temp.path().join("sub/b.txt").is_file());
/// ```
pub fn write_tree(root: &Path, entries: &[(&str, &str)]) {
    for (path, content) in entries {
        let full = root.join(path);
        if path.ends_with('/') {
            fs::create_dir_all(&full).unwrap();
        } else {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, content).unwrap();
        }
    }
}

/// Writes `ddd.tar.gz` into `dir`: it holds `ccc/bbb.tar.gz`, which holds
/// `aaa/world.txt`. Returns the path of the outer archive.
pub fn write_nested_archive(dir: &Path) -> PathBuf {
    let inner = TarTestBuilder::new()
        .add_directory("aaa/")
        .add_file("aaa/world.txt", b"hello, world\n")
        .build();
    let outer = TarTestBuilder::new()
        .add_directory("ccc/")
        .add_file("ccc/bbb.tar.gz", &gzip(&inner))
        .build();

    let path = dir.join("ddd.tar.gz");
    fs::write(&path, gzip(&outer)).unwrap();
    path
}
