//! Post-processing of the CPack archive.
//!
//! After CMake has produced `oidn-*` in the build directory the archive is
//! unpacked, its binaries are inventoried, checked and optionally signed, the
//! archive is rebuilt if anything was signed, and the unpacked tree is removed.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::archive::{create_archive, extract_archive, strip_archive_suffix};
use crate::compat::SymbolChecker;
use crate::core::Platform;
use crate::sign::Signer;
use crate::util::fs::{glob_paths, is_regular_file, remove_dir_all_if_exists, remove_file};
use crate::util::hash::sha256_file;

/// File name prefix of packages produced by CPack.
pub const PACKAGE_PREFIX: &str = "oidn-";

/// Packaging errors.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("no package matching `{pattern}` in {}", .dir.display())]
    NoPackage { dir: PathBuf, pattern: String },

    #[error("ambiguous package: {} files match `{pattern}` in {} (remove stale packages first): {}",
        .matches.len(), .dir.display(), display_names(.matches))]
    AmbiguousPackage {
        dir: PathBuf,
        pattern: String,
        matches: Vec<PathBuf>,
    },
}

fn display_names(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the single package archive in `build_dir`.
pub fn locate_package(build_dir: &Path, platform: Platform) -> Result<PathBuf> {
    let pattern = format!("{}*{}", PACKAGE_PREFIX, platform.package_suffix());
    let mut matches = glob_paths(build_dir, &pattern)?;
    matches.retain(|p| p.is_file());

    match matches.len() {
        0 => Err(PackageError::NoPackage {
            dir: build_dir.to_path_buf(),
            pattern,
        }
        .into()),
        1 => Ok(matches.remove(0)),
        _ => Err(PackageError::AmbiguousPackage {
            dir: build_dir.to_path_buf(),
            pattern,
            matches,
        }
        .into()),
    }
}

/// Executables under `bin/` and, off Windows, shared libraries under `lib/`.
///
/// Symbolic links are skipped so each library is handled once.
pub fn list_binaries(package_dir: &Path, platform: Platform) -> Result<Vec<PathBuf>> {
    let mut binaries = glob_paths(package_dir, "bin/*")?;
    if !platform.is_windows() {
        binaries.extend(glob_paths(package_dir, "lib/*.so*")?);
    }
    binaries.retain(|p| is_regular_file(p));
    Ok(binaries)
}

/// Result of post-processing a package.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    /// The final archive
    pub archive: PathBuf,
    /// Binaries found in the package
    pub binaries: Vec<PathBuf>,
    /// Whether the archive was rebuilt from signed binaries
    pub signed: bool,
    /// SHA-256 of the final archive
    pub sha256: String,
}

/// Unpacks, checks, signs and repacks the archive in a build directory.
pub struct Packager {
    build_dir: PathBuf,
    platform: Platform,
    checker: Option<SymbolChecker>,
    signer: Option<Signer>,
}

impl Packager {
    pub fn new(build_dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Packager {
            build_dir: build_dir.into(),
            platform,
            checker: None,
            signer: None,
        }
    }

    /// Check binaries with `checker` before signing.
    pub fn with_checker(mut self, checker: Option<SymbolChecker>) -> Self {
        self.checker = checker;
        self
    }

    /// Sign binaries with `signer` and repack.
    pub fn with_signer(mut self, signer: Option<Signer>) -> Self {
        self.signer = signer;
        self
    }

    pub fn finish(&self) -> Result<PackageOutcome> {
        let archive = locate_package(&self.build_dir, self.platform)?;
        extract_archive(&archive, &self.build_dir)?;
        let package_dir = strip_archive_suffix(&archive);

        let binaries = list_binaries(&package_dir, self.platform)?;
        tracing::debug!("{} binaries in {}", binaries.len(), package_dir.display());

        if let Some(checker) = &self.checker {
            for binary in &binaries {
                checker.check(binary)?;
            }
        }

        let signed = match &self.signer {
            Some(signer) => {
                signer.sign_all(&binaries)?;
                remove_file(&archive)?;
                create_archive(&archive, &package_dir)?;
                true
            }
            None => false,
        };

        remove_dir_all_if_exists(&package_dir)?;

        let sha256 = sha256_file(&archive)?;
        tracing::info!("Package: {} (sha256 {})", archive.display(), sha256);

        Ok(PackageOutcome {
            archive,
            binaries,
            signed,
            sha256,
        })
    }
}
