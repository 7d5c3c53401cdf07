//! Host platform detection and per-platform parameter tables.
//!
//! Every table is an exhaustive `match` on [`Platform`], so adding a platform
//! without filling in all of its entries does not compile.

use std::fmt;

use thiserror::Error;

use super::Compiler;

/// Errors raised while selecting the platform or validating user choices.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("unsupported host operating system `{os}` (expected windows, linux or macos)")]
    UnsupportedHost { os: String },

    #[error("compiler `{compiler}` is not supported on {platform} (choose from: {allowed})")]
    CompilerNotAllowed {
        compiler: Compiler,
        platform: Platform,
        allowed: String,
    },

    #[error("unknown compiler `{0}` (expected msvc, icc, gcc or clang)")]
    UnknownCompiler(String),

    #[error("unknown build configuration `{0}` (expected Debug, Release or RelWithDebInfo)")]
    UnknownConfig(String),

    #[error("unknown stage `{0}` (expected build or package)")]
    UnknownStage(String),
}

impl PlatformError {
    pub(crate) fn not_allowed(compiler: Compiler, platform: Platform) -> Self {
        PlatformError::CompilerNotAllowed {
            compiler,
            platform,
            allowed: platform
                .compilers()
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Operating system the release is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    Macos,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: [Platform; 3] = [Platform::Windows, Platform::Linux, Platform::Macos];

    /// Detect the host platform.
    pub fn detect() -> Result<Self, PlatformError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Result<Self, PlatformError> {
        match os {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::Macos),
            other => Err(PlatformError::UnsupportedHost {
                os: other.to_string(),
            }),
        }
    }

    /// Lowercase platform name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Macos => "macos",
        }
    }

    /// Suffix of platform-scoped environment variables.
    pub fn env_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => "WINDOWS",
            Platform::Linux => "LINUX",
            Platform::Macos => "MACOS",
        }
    }

    /// Compilers a release may be built with on this platform.
    pub fn compilers(&self) -> &'static [Compiler] {
        match self {
            Platform::Windows => &[Compiler::Msvc, Compiler::Icc],
            Platform::Linux => &[Compiler::Gcc, Compiler::Clang, Compiler::Icc],
            Platform::Macos => &[Compiler::Clang, Compiler::Icc],
        }
    }

    /// Compiler used when none is requested.
    pub fn default_compiler(&self) -> Compiler {
        Compiler::Icc
    }

    /// Validate a requested compiler, falling back to the platform default.
    pub fn select_compiler(&self, requested: Option<Compiler>) -> Result<Compiler, PlatformError> {
        let compiler = requested.unwrap_or_else(|| self.default_compiler());
        if self.compilers().contains(&compiler) {
            Ok(compiler)
        } else {
            Err(PlatformError::not_allowed(compiler, *self))
        }
    }

    /// Extension of the archive the packaging target produces.
    pub fn package_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".zip",
            Platform::Linux => ".tar.gz",
            Platform::Macos => ".tar.gz",
        }
    }

    /// Extension of executables.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::Linux | Platform::Macos => "",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
