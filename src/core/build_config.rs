//! Build configurations and pipeline stages.

use std::fmt;
use std::str::FromStr;

use super::PlatformError;

/// CMake build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildConfig {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
}

impl BuildConfig {
    /// Name passed to CMake (`CMAKE_BUILD_TYPE` / `--config`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildConfig::Debug => "Debug",
            BuildConfig::Release => "Release",
            BuildConfig::RelWithDebInfo => "RelWithDebInfo",
        }
    }

    /// Name of the build directory, e.g. `build_release`.
    pub fn build_dir_name(&self) -> String {
        format!("build_{}", self.as_str().to_lowercase())
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildConfig {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildConfig::Debug),
            "Release" => Ok(BuildConfig::Release),
            "RelWithDebInfo" => Ok(BuildConfig::RelWithDebInfo),
            other => Err(PlatformError::UnknownConfig(other.to_string())),
        }
    }
}

/// Pipeline stage selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Provision dependencies, configure and compile
    Build,
    /// Package, check, sign and repack
    Package,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::Package => "package",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Stage::Build),
            "package" => Ok(Stage::Package),
            other => Err(PlatformError::UnknownStage(other.to_string())),
        }
    }
}
