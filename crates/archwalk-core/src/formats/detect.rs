//! Archive format detection.
//!
//! Detection is two-stage: the file extension picks a candidate format and
//! the leading bytes of the file must then agree with it. [`probe`] never
//! fails; anything that goes wrong just means "not an archive".

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use tracing::trace;

use super::compression::CompressionCodec;
use crate::Result;
use crate::WalkError;

/// 7z format magic bytes.
const SEVENZ_MAGIC: [u8; 6] = [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];

/// Zip local file header and end-of-central-directory (empty archive)
/// signatures.
const ZIP_MAGIC: [&[u8]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// Offset of the `ustar` magic inside a tar header block.
const TAR_MAGIC_OFFSET: usize = 257;

/// Bytes read from the head of a file while probing.
const PROBE_LEN: usize = 512;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// Tar archive (uncompressed).
    Tar,
    /// Tar archive wrapped in a compression codec.
    CompressedTar(CompressionCodec),
    /// ZIP archive.
    Zip,
    /// 7z archive.
    SevenZ,
    /// A single compressed file, such as `notes.txt.gz`.
    Compressed(CompressionCodec),
}

/// A file that was confirmed to be an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    path: PathBuf,
    format: ArchiveType,
}

impl ArchiveHandle {
    /// Returns the path of the archive file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the detected format.
    #[must_use]
    pub const fn format(&self) -> ArchiveType {
        self.format
    }
}

/// Detects the archive type from a file path.
///
/// # Errors
///
/// Returns [`WalkError::UnsupportedFormat`] if the extension is not a known
/// archive extension.
pub fn detect_format(path: &Path) -> Result<ArchiveType> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or(WalkError::UnsupportedFormat)?;

    let tar_stem = path
        .file_stem()
        .is_some_and(|stem| stem.to_string_lossy().to_ascii_lowercase().ends_with(".tar"));
    let wrapped = |codec| {
        if tar_stem {
            ArchiveType::CompressedTar(codec)
        } else {
            ArchiveType::Compressed(codec)
        }
    };

    match extension.to_ascii_lowercase().as_str() {
        "tar" => Ok(ArchiveType::Tar),
        "tgz" => Ok(ArchiveType::CompressedTar(CompressionCodec::Gzip)),
        "tbz" | "tbz2" => Ok(ArchiveType::CompressedTar(CompressionCodec::Bzip2)),
        "txz" => Ok(ArchiveType::CompressedTar(CompressionCodec::Xz)),
        "tzst" => Ok(ArchiveType::CompressedTar(CompressionCodec::Zstd)),
        "gz" => Ok(wrapped(CompressionCodec::Gzip)),
        "bz2" => Ok(wrapped(CompressionCodec::Bzip2)),
        "xz" => Ok(wrapped(CompressionCodec::Xz)),
        "zst" => Ok(wrapped(CompressionCodec::Zstd)),
        "zip" => Ok(ArchiveType::Zip),
        "7z" => Ok(ArchiveType::SevenZ),
        _ => Err(WalkError::UnsupportedFormat),
    }
}

/// Checks whether `head` (the first bytes of a file) matches `format`.
fn magic_matches(head: &[u8], format: ArchiveType) -> bool {
    match format {
        ArchiveType::Tar => head
            .get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5)
            .is_some_and(|magic| magic == b"ustar"),
        ArchiveType::CompressedTar(codec) | ArchiveType::Compressed(codec) => {
            head.starts_with(codec.magic())
        }
        ArchiveType::Zip => ZIP_MAGIC.iter().any(|magic| head.starts_with(magic)),
        ArchiveType::SevenZ => head.starts_with(&SEVENZ_MAGIC),
    }
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(PROBE_LEN);
    File::open(path)?
        .take(PROBE_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

/// Probes `path` and returns a handle if it is a supported archive.
///
/// Unknown extensions, unreadable files and magic mismatches all return
/// `None`.
///
/// # Examples
///
/// ```no_run
/// use archwalk_core::formats::probe;
/// use std::path::Path;
///
/// if let Some(handle) = probe(Path::new("release.tar.gz")) {
///     println!("{:?}", handle.format());
/// }
/// ```
#[must_use]
pub fn probe(path: &Path) -> Option<ArchiveHandle> {
    let format = detect_format(path).ok()?;
    match read_head(path) {
        Ok(head) if magic_matches(&head, format) => Some(ArchiveHandle {
            path: path.to_path_buf(),
            format,
        }),
        Ok(_) => {
            trace!(path = %path.display(), ?format, "extension matched but magic did not");
            None
        }
        Err(e) => {
            trace!(path = %path.display(), error = %e, "archive probe failed");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_tar() {
        let path = PathBuf::from("archive.tar");
        assert_eq!(detect_format(&path).unwrap(), ArchiveType::Tar);
    }

    #[test]
    fn test_detect_tar_gz() {
        let gz = ArchiveType::CompressedTar(CompressionCodec::Gzip);
        assert_eq!(detect_format(Path::new("archive.tar.gz")).unwrap(), gz);
        assert_eq!(detect_format(Path::new("archive.tgz")).unwrap(), gz);
        assert_eq!(detect_format(Path::new("ARCHIVE.TAR.GZ")).unwrap(), gz);
    }

    #[test]
    fn test_detect_compressed_tar_variants() {
        assert_eq!(
            detect_format(Path::new("a.tar.bz2")).unwrap(),
            ArchiveType::CompressedTar(CompressionCodec::Bzip2)
        );
        assert_eq!(
            detect_format(Path::new("a.tbz")).unwrap(),
            ArchiveType::CompressedTar(CompressionCodec::Bzip2)
        );
        assert_eq!(
            detect_format(Path::new("a.txz")).unwrap(),
            ArchiveType::CompressedTar(CompressionCodec::Xz)
        );
        assert_eq!(
            detect_format(Path::new("a.tar.zst")).unwrap(),
            ArchiveType::CompressedTar(CompressionCodec::Zstd)
        );
    }

    #[test]
    fn test_detect_single_compressed_file() {
        assert_eq!(
            detect_format(Path::new("notes.txt.gz")).unwrap(),
            ArchiveType::Compressed(CompressionCodec::Gzip)
        );
        assert_eq!(
            detect_format(Path::new("dump.sql.xz")).unwrap(),
            ArchiveType::Compressed(CompressionCodec::Xz)
        );
    }

    #[test]
    fn test_detect_zip_and_7z() {
        assert_eq!(detect_format(Path::new("a.zip")).unwrap(), ArchiveType::Zip);
        assert_eq!(detect_format(Path::new("A.7Z")).unwrap(), ArchiveType::SevenZ);
    }

    #[test]
    fn test_detect_unsupported() {
        assert!(matches!(
            detect_format(Path::new("archive.rar")),
            Err(WalkError::UnsupportedFormat)
        ));
        assert!(matches!(
            detect_format(Path::new("Makefile")),
            Err(WalkError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_probe_accepts_real_archives() {
        let temp = TempDir::new().unwrap();
        let tar_path = temp.path().join("plain.tar");
        fs::write(&tar_path, test_utils::create_test_tar(&[("a.txt", "a")])).unwrap();
        let zip_path = temp.path().join("bundle.zip");
        fs::write(&zip_path, test_utils::create_test_zip(&[("b.txt", "b")])).unwrap();
        let tgz_path = temp.path().join("packed.tar.gz");
        fs::write(
            &tgz_path,
            test_utils::gzip(&test_utils::create_test_tar(&[("c.txt", "c")])),
        )
        .unwrap();

        assert_eq!(probe(&tar_path).unwrap().format(), ArchiveType::Tar);
        assert_eq!(probe(&zip_path).unwrap().format(), ArchiveType::Zip);
        assert_eq!(
            probe(&tgz_path).unwrap().format(),
            ArchiveType::CompressedTar(CompressionCodec::Gzip)
        );
        assert_eq!(probe(&tgz_path).unwrap().path(), tgz_path);
    }

    #[test]
    fn test_probe_rejects_impostor() {
        let temp = TempDir::new().unwrap();
        let fake = temp.path().join("not-really.tar.gz");
        fs::write(&fake, "just some text").unwrap();
        assert!(probe(&fake).is_none());
    }

    #[test]
    fn test_probe_missing_file_is_not_archive() {
        let temp = TempDir::new().unwrap();
        assert!(probe(&temp.path().join("missing.zip")).is_none());
    }

    #[test]
    fn test_probe_directory_is_not_archive() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("looks-like.zip");
        fs::create_dir(&dir).unwrap();
        assert!(probe(&dir).is_none());
    }
}
