//! Archive format detection by file name.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Archive handling errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unsupported package format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Archive formats the release tool reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed tarball (`.tar`)
    Tar,
    /// Gzip-compressed tarball (`.tar.gz`, `.tgz`)
    TarGz,
    /// Zstandard-compressed tarball (`.tar.zst`, `.tzst`)
    TarZst,
    /// Zip archive (`.zip`)
    Zip,
}

impl ArchiveFormat {
    /// Determine the format of `path` from its suffix.
    pub fn from_path(path: &Path) -> Result<Self, ArchiveError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let format = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            ArchiveFormat::TarZst
        } else if name.ends_with(".tar") {
            ArchiveFormat::Tar
        } else if name.ends_with(".zip") {
            ArchiveFormat::Zip
        } else {
            return Err(ArchiveError::UnsupportedFormat(path.to_path_buf()));
        };

        Ok(format)
    }
}

static ARCHIVE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(tar(\..*)?|zip)$").expect("valid regex"));

/// Strip an archive suffix from a path, giving the directory the archive
/// unpacks to: `oidn-1.2.0.x86_64.linux.tar.gz` -> `oidn-1.2.0.x86_64.linux`.
///
/// Only the file name is touched; parent directories are kept as-is.
pub fn strip_archive_suffix(path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            let stem = ARCHIVE_SUFFIX.replace(&name.to_string_lossy(), "").into_owned();
            path.with_file_name(stem)
        }
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        let cases = [
            ("ispc-v1.12.0b-linux.tar.gz", ArchiveFormat::TarGz),
            ("tbb-2020.1-lin.tgz", ArchiveFormat::TarGz),
            ("ispc-v1.12.0-windows.zip", ArchiveFormat::Zip),
            ("bundle.tar", ArchiveFormat::Tar),
            ("bundle.tar.zst", ArchiveFormat::TarZst),
            ("OIDN-1.2.0.X86_64.LINUX.TAR.GZ", ArchiveFormat::TarGz),
        ];
        for (name, expected) in cases {
            assert_eq!(
                ArchiveFormat::from_path(Path::new(name)).unwrap(),
                expected,
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_unsupported_format() {
        for name in ["notes.txt", "bundle.7z", "bundle.tar.xz", "bundle.tar.bz2", "tar"] {
            let err = ArchiveFormat::from_path(Path::new(name)).unwrap_err();
            assert!(err.to_string().starts_with("unsupported package format"));
        }
    }

    #[test]
    fn test_strip_archive_suffix() {
        assert_eq!(
            strip_archive_suffix(Path::new("/b/oidn-1.2.0.x86_64.linux.tar.gz")),
            PathBuf::from("/b/oidn-1.2.0.x86_64.linux")
        );
        assert_eq!(
            strip_archive_suffix(Path::new("/b/oidn-1.2.0.x64.vc14.windows.zip")),
            PathBuf::from("/b/oidn-1.2.0.x64.vc14.windows")
        );
        assert_eq!(
            strip_archive_suffix(Path::new("oidn-1.2.0.x86_64.macos.tar")),
            PathBuf::from("oidn-1.2.0.x86_64.macos")
        );
        assert_eq!(
            strip_archive_suffix(Path::new("oidn-1.2.0")),
            PathBuf::from("oidn-1.2.0")
        );
    }

    #[test]
    fn test_strip_archive_suffix_ignores_parent_dirs() {
        assert_eq!(
            strip_archive_suffix(Path::new(
                "/home/ci/work.tar.d/oidn/build_release/oidn-1.2.0.x86_64.linux.tar.gz"
            )),
            PathBuf::from("/home/ci/work.tar.d/oidn/build_release/oidn-1.2.0.x86_64.linux")
        );
        assert_eq!(
            strip_archive_suffix(Path::new("/src/release.zip/build_release/oidn-1.2.0")),
            PathBuf::from("/src/release.zip/build_release/oidn-1.2.0")
        );
    }
}
