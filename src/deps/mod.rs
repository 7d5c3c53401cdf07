//! Provisioning of the pinned third-party toolchains.
//!
//! Two dependencies are needed to configure OIDN: the ISPC compiler and the
//! TBB threading runtime. Each lives in `deps/<release name>`; an existing,
//! non-empty directory is reused as-is and nothing is downloaded.

pub mod download;

use std::path::PathBuf;

use anyhow::{Context, Result};
use thiserror::Error;
use url::Url;

use crate::archive::extract_archive;
use crate::core::Platform;
use crate::util::fs::{ensure_dir, is_non_empty_dir, remove_file};

pub use download::{Downloader, HttpDownloader};

/// Pinned ISPC release.
pub const ISPC_VERSION: &str = "1.12.0";

/// ISPC release used for the Linux download, which is published under a
/// different tag suffix than the other platforms.
pub const ISPC_VERSION_LINUX: &str = "1.12.0b";

/// Pinned TBB release.
pub const TBB_VERSION: &str = "2020.1";

/// Provisioning errors.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{name} is not present in {} and downloads are disabled (offline)", .dir.display())]
    Offline { name: &'static str, dir: PathBuf },
}

/// A provisioned third-party dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// Intel SPMD Program Compiler
    Ispc,
    /// Threading Building Blocks
    Tbb,
}

impl Dependency {
    pub fn name(&self) -> &'static str {
        match self {
            Dependency::Ispc => "ISPC",
            Dependency::Tbb => "TBB",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            Dependency::Ispc => ISPC_VERSION,
            Dependency::Tbb => TBB_VERSION,
        }
    }

    /// Name of the cache directory, e.g. `ispc-v1.12.0-linux` or `tbb-2020.1-lin`.
    pub fn release_name(&self, platform: Platform) -> String {
        match self {
            Dependency::Ispc => {
                let os = match platform {
                    Platform::Windows => "windows",
                    Platform::Linux => "linux",
                    Platform::Macos => "macOS",
                };
                format!("ispc-v{}-{}", ISPC_VERSION, os)
            }
            Dependency::Tbb => {
                let os = match platform {
                    Platform::Windows => "win",
                    Platform::Linux => "lin",
                    Platform::Macos => "mac",
                };
                format!("tbb-{}-{}", TBB_VERSION, os)
            }
        }
    }

    /// Archive extension of the upstream release.
    pub fn archive_suffix(&self, platform: Platform) -> &'static str {
        match (self, platform) {
            (_, Platform::Windows) => ".zip",
            (Dependency::Ispc, Platform::Linux | Platform::Macos) => ".tar.gz",
            (Dependency::Tbb, Platform::Linux | Platform::Macos) => ".tgz",
        }
    }

    /// Upstream download URL.
    pub fn download_url(&self, platform: Platform) -> Result<Url> {
        let url = match self {
            Dependency::Ispc => {
                let file_stem = match platform {
                    Platform::Linux => format!("ispc-v{}-linux", ISPC_VERSION_LINUX),
                    Platform::Windows | Platform::Macos => self.release_name(platform),
                };
                format!(
                    "https://github.com/ispc/ispc/releases/download/v{}/{}{}",
                    ISPC_VERSION,
                    file_stem,
                    self.archive_suffix(platform)
                )
            }
            Dependency::Tbb => format!(
                "https://github.com/oneapi-src/oneTBB/releases/download/v{}/{}{}",
                TBB_VERSION,
                self.release_name(platform),
                self.archive_suffix(platform)
            ),
        };
        Url::parse(&url).with_context(|| format!("invalid download URL: {}", url))
    }

    /// Whether the archive lacks a top-level directory of its own and must be
    /// unpacked inside the release directory.
    fn unpacks_into_release_dir(&self) -> bool {
        matches!(self, Dependency::Tbb)
    }
}

/// Paths handed to CMake once both dependencies are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchains {
    /// The `ispc` executable (with `.exe` on Windows)
    pub ispc_executable: PathBuf,
    /// The TBB installation root
    pub tbb_root: PathBuf,
}

/// Ensures dependencies are present in a cache directory.
pub struct Provisioner<'a> {
    deps_dir: PathBuf,
    platform: Platform,
    downloader: &'a dyn Downloader,
    offline: bool,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        deps_dir: impl Into<PathBuf>,
        platform: Platform,
        downloader: &'a dyn Downloader,
    ) -> Self {
        Provisioner {
            deps_dir: deps_dir.into(),
            platform,
            downloader,
            offline: false,
        }
    }

    /// Fail on a cache miss instead of downloading.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Ensure a dependency is present and return its directory.
    pub fn ensure(&self, dep: Dependency) -> Result<PathBuf> {
        let release_dir = self.deps_dir.join(dep.release_name(self.platform));

        if is_non_empty_dir(&release_dir) {
            tracing::debug!(
                "{} {} already present in {}",
                dep.name(),
                dep.version(),
                release_dir.display()
            );
            return Ok(release_dir);
        }

        if self.offline {
            return Err(ProvisionError::Offline {
                name: dep.name(),
                dir: release_dir,
            }
            .into());
        }

        tracing::info!("Setting up {} {}", dep.name(), dep.version());
        ensure_dir(&self.deps_dir)?;

        let url = dep.download_url(self.platform)?;
        let archive = self.downloader.download(&url, &self.deps_dir)?;

        let extract_dir = if dep.unpacks_into_release_dir() {
            ensure_dir(&release_dir)?;
            release_dir.as_path()
        } else {
            self.deps_dir.as_path()
        };
        extract_archive(&archive, extract_dir)?;
        remove_file(&archive)?;

        Ok(release_dir)
    }

    /// Ensure both dependencies and return the paths CMake needs.
    pub fn provision_all(&self) -> Result<Toolchains> {
        let ispc_dir = self.ensure(Dependency::Ispc)?;
        let tbb_dir = self.ensure(Dependency::Tbb)?;

        Ok(Toolchains {
            ispc_executable: ispc_dir
                .join("bin")
                .join(format!("ispc{}", self.platform.exe_suffix())),
            tbb_root: tbb_dir.join("tbb"),
        })
    }
}
