//! Unpacking probed archives into a target directory.

use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use super::detect::ArchiveHandle;
use super::detect::ArchiveType;
use crate::Result;
use crate::WalkError;

/// Name used for the output of a single compressed file without a usable
/// stem.
const FALLBACK_STEM: &str = "data";

/// Unpacks `handle` into `target`, which must already exist.
///
/// Tar variants are unpacked by the `tar` crate, which refuses entries that
/// would land outside `target`. Zip entries go through
/// `ZipArchive::extract`, 7z through `sevenz-rust2`. A single compressed file
/// is decoded to `target/<file stem>`.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or decoded, or if writing
/// into `target` fails.
pub fn extract_to(handle: &ArchiveHandle, target: &Path) -> Result<()> {
    let path = handle.path();
    match handle.format() {
        ArchiveType::Tar => unpack_tar(open(path)?, target),
        ArchiveType::CompressedTar(codec) => unpack_tar(codec.decoder(open(path)?)?, target),
        ArchiveType::Zip => unpack_zip(path, target),
        ArchiveType::SevenZ => sevenz_rust2::decompress_file(path, target)
            .map_err(|e| WalkError::InvalidArchive(format!("failed to unpack 7z: {e}"))),
        ArchiveType::Compressed(codec) => {
            let stem = path
                .file_stem()
                .filter(|stem| !stem.is_empty())
                .unwrap_or_else(|| OsStr::new(FALLBACK_STEM));
            let mut decoder = codec.decoder(open(path)?)?;
            let mut output = File::create(target.join(stem))?;
            std::io::copy(&mut decoder, &mut output).map_err(|e| {
                WalkError::InvalidArchive(format!("failed to decode {} stream: {e}", codec.name()))
            })?;
            Ok(())
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

fn unpack_tar<R: Read>(reader: R, target: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(false);
    archive.set_unpack_xattrs(false);
    archive
        .unpack(target)
        .map_err(|e| WalkError::InvalidArchive(format!("failed to unpack TAR: {e}")))
}

fn unpack_zip(path: &Path, target: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)
        .map_err(|e| WalkError::InvalidArchive(format!("failed to read ZIP: {e}")))?;
    archive
        .extract(target)
        .map_err(|e| WalkError::InvalidArchive(format!("failed to unpack ZIP: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::formats::CompressionCodec;
    use crate::formats::probe;
    use crate::test_utils;
    use bzip2::write::BzEncoder;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use xz2::write::XzEncoder;

    fn write_archive(dir: &Path, name: &str, data: &[u8]) -> ArchiveHandle {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        probe(&path).unwrap()
    }

    #[test]
    fn test_extract_tar_gz() {
        let temp = TempDir::new().unwrap();
        let tar = test_utils::create_test_tar(&[("dir/nested.txt", "world")]);
        let handle = write_archive(temp.path(), "packed.tar.gz", &test_utils::gzip(&tar));

        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        extract_to(&handle, &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("dir/nested.txt")).unwrap(), "world");
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let zip = test_utils::create_test_zip(&[("a.txt", "hello"), ("b/c.txt", "deep")]);
        let handle = write_archive(temp.path(), "bundle.zip", &zip);

        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        extract_to(&handle, &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "hello");
        assert_eq!(fs::read_to_string(out.join("b/c.txt")).unwrap(), "deep");
    }

    #[test]
    fn test_extract_single_gzip_file() {
        let temp = TempDir::new().unwrap();
        let handle = write_archive(temp.path(), "notes.txt.gz", &test_utils::gzip(b"remember"));

        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        extract_to(&handle, &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "remember");
    }

    fn extracted(temp: &TempDir, handle: &ArchiveHandle) -> std::path::PathBuf {
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        extract_to(handle, &out).unwrap();
        out
    }

    fn sample_tar() -> Vec<u8> {
        test_utils::create_test_tar(&[("pkg/readme.txt", "packed"), ("top.txt", "top")])
    }

    #[test]
    fn test_extract_tar_bz2() {
        let temp = TempDir::new().unwrap();
        let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
        encoder.write_all(&sample_tar()).unwrap();
        let handle = write_archive(temp.path(), "packed.tar.bz2", &encoder.finish().unwrap());
        assert_eq!(
            handle.format(),
            ArchiveType::CompressedTar(CompressionCodec::Bzip2)
        );

        let out = extracted(&temp, &handle);
        assert_eq!(fs::read_to_string(out.join("pkg/readme.txt")).unwrap(), "packed");
        assert_eq!(fs::read_to_string(out.join("top.txt")).unwrap(), "top");
    }

    #[test]
    fn test_extract_tar_xz() {
        let temp = TempDir::new().unwrap();
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(&sample_tar()).unwrap();
        let handle = write_archive(temp.path(), "packed.tar.xz", &encoder.finish().unwrap());
        assert_eq!(handle.format(), ArchiveType::CompressedTar(CompressionCodec::Xz));

        let out = extracted(&temp, &handle);
        assert_eq!(fs::read_to_string(out.join("pkg/readme.txt")).unwrap(), "packed");
    }

    #[test]
    fn test_extract_tar_zst() {
        let temp = TempDir::new().unwrap();
        let compressed = zstd::encode_all(&sample_tar()[..], 0).unwrap();
        let handle = write_archive(temp.path(), "packed.tzst", &compressed);
        assert_eq!(
            handle.format(),
            ArchiveType::CompressedTar(CompressionCodec::Zstd)
        );

        let out = extracted(&temp, &handle);
        assert_eq!(fs::read_to_string(out.join("pkg/readme.txt")).unwrap(), "packed");
    }

    #[test]
    fn test_extract_single_xz_file() {
        let temp = TempDir::new().unwrap();
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(b"select 1;").unwrap();
        let handle = write_archive(temp.path(), "dump.sql.xz", &encoder.finish().unwrap());

        let out = extracted(&temp, &handle);
        assert_eq!(fs::read_to_string(out.join("dump.sql")).unwrap(), "select 1;");
    }

    #[test]
    fn test_extract_7z() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        test_utils::write_tree(&src, &[("docs/a.txt", "alpha"), ("b.txt", "beta")]);
        let archive = temp.path().join("bundle.7z");
        sevenz_rust2::compress_to_path(&src, &archive).unwrap();
        let handle = probe(&archive).unwrap();
        assert_eq!(handle.format(), ArchiveType::SevenZ);

        let out = extracted(&temp, &handle);
        assert_eq!(fs::read_to_string(out.join("docs/a.txt")).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(out.join("b.txt")).unwrap(), "beta");
    }

    #[test]
    fn test_extract_truncated_7z_fails() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        test_utils::write_tree(&src, &[("big.txt", &"x".repeat(4096))]);
        let full = temp.path().join("full.7z");
        sevenz_rust2::compress_to_path(&src, &full).unwrap();
        let mut data = fs::read(&full).unwrap();
        data.truncate(40);
        let handle = write_archive(temp.path(), "broken.7z", &data);

        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        let result = extract_to(&handle, &out);
        assert!(matches!(result, Err(WalkError::InvalidArchive(_))));
    }

    #[test]
    fn test_extract_truncated_archive_fails() {
        let temp = TempDir::new().unwrap();
        let tar = test_utils::create_test_tar(&[("big.txt", "x".repeat(4096))]);
        let mut gz = test_utils::gzip(&tar);
        gz.truncate(20);
        let handle = write_archive(temp.path(), "broken.tar.gz", &gz);

        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        let result = extract_to(&handle, &out);
        assert!(matches!(result, Err(WalkError::InvalidArchive(_))));
    }
}
