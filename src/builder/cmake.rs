//! CMake driver for the OIDN release build.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::{BuildConfig, Compiler, Platform, PlatformError};
use crate::deps::Toolchains;
use crate::util::fs::recreate_dir;
use crate::util::process::ProcessBuilder;

/// Visual Studio generator used for Windows releases.
pub const MSVC_GENERATOR: &str = "Visual Studio 15 2017 Win64";

/// Intel compiler version selected through the Visual Studio toolset.
pub const ICC_VERSION: &str = "18.0";

/// How CMake is told which compiler to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerSetup {
    /// Visual Studio generator, optionally with a non-default toolset.
    VisualStudio {
        generator: &'static str,
        toolset: Option<String>,
    },
    /// Explicit C and C++ compiler executables.
    Executables { cc: PathBuf, cxx: PathBuf },
}

impl CompilerSetup {
    /// Pick the generator or compiler pair for `compiler` on `platform`.
    ///
    /// `install_dir` is the vendor installation directory for compilers that
    /// are not expected on PATH; it is ignored for the others.
    pub fn new(
        platform: Platform,
        compiler: Compiler,
        install_dir: Option<&Path>,
    ) -> Result<Self, PlatformError> {
        let compiler = platform.select_compiler(Some(compiler))?;

        if platform.is_windows() {
            let toolset = match compiler {
                Compiler::Icc => Some(format!("Intel C++ Compiler {}", ICC_VERSION)),
                _ => None,
            };
            return Ok(CompilerSetup::VisualStudio {
                generator: MSVC_GENERATOR,
                toolset,
            });
        }

        let (cc, cxx) = compiler
            .executables()
            .ok_or_else(|| PlatformError::not_allowed(compiler, platform))?;

        let (cc, cxx) = match install_dir.filter(|_| compiler.install_dir_var().is_some()) {
            Some(dir) => (dir.join(cc), dir.join(cxx)),
            None => (PathBuf::from(cc), PathBuf::from(cxx)),
        };

        Ok(CompilerSetup::Executables { cc, cxx })
    }
}

/// Drives configure, build and package steps in one build directory.
///
/// Every command runs with the build directory as its working directory.
#[derive(Debug, Clone)]
pub struct CMakeDriver {
    cmake: PathBuf,
    source_dir: PathBuf,
    build_dir: PathBuf,
    platform: Platform,
    config: BuildConfig,
}

impl CMakeDriver {
    pub fn new(
        cmake: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        platform: Platform,
        config: BuildConfig,
    ) -> Self {
        CMakeDriver {
            cmake: cmake.into(),
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            platform,
            config,
        }
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn cmake(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.cmake).cwd(&self.build_dir)
    }

    /// Initial configure command.
    pub fn configure_command(&self, setup: &CompilerSetup, toolchains: &Toolchains) -> ProcessBuilder {
        let mut cmd = self.cmake().arg("-L");

        match setup {
            CompilerSetup::VisualStudio { generator, toolset } => {
                cmd = cmd.arg("-G").arg(generator);
                if let Some(toolset) = toolset {
                    cmd = cmd.arg("-T").arg(toolset);
                }
            }
            CompilerSetup::Executables { cc, cxx } => {
                cmd = cmd
                    .arg(format!("-DCMAKE_C_COMPILER:FILEPATH={}", cc.display()))
                    .arg(format!("-DCMAKE_CXX_COMPILER:FILEPATH={}", cxx.display()))
                    .arg(format!("-DCMAKE_BUILD_TYPE={}", self.config));
            }
        }

        cmd.arg(format!(
            "-DISPC_EXECUTABLE={}",
            toolchains.ispc_executable.display()
        ))
        .arg(format!("-DTBB_ROOT={}", toolchains.tbb_root.display()))
        .arg(&self.source_dir)
    }

    /// Compile command.
    pub fn build_command(&self) -> ProcessBuilder {
        let cmd = self.cmake().args(["--build", "."]);
        if self.platform.is_windows() {
            cmd.args(["--config", self.config.as_str(), "--target", "ALL_BUILD"])
        } else {
            cmd.args(["--target", "preinstall", "-j", "-v"])
        }
    }

    /// Reconfigure with zip-mode packaging enabled.
    pub fn package_configure_command(&self) -> ProcessBuilder {
        self.cmake()
            .arg("-L")
            .arg("-DOIDN_ZIP_MODE=ON")
            .arg(&self.source_dir)
    }

    /// Packaging command.
    pub fn package_command(&self) -> ProcessBuilder {
        let cmd = self.cmake().args(["--build", "."]);
        if self.platform.is_windows() {
            cmd.args(["--config", self.config.as_str(), "--target", "PACKAGE"])
        } else {
            cmd.args(["--target", "package", "-j", "-v"])
        }
    }

    /// Recreate the build directory, configure and compile.
    pub fn build(&self, setup: &CompilerSetup, toolchains: &Toolchains) -> Result<()> {
        recreate_dir(&self.build_dir)?;

        tracing::info!("Configuring {} build in {}", self.config, self.build_dir.display());
        self.configure_command(setup, toolchains).run()?;

        tracing::info!("Building");
        self.build_command().run()
    }

    /// Reconfigure for packaging and build the package target.
    pub fn package(&self) -> Result<()> {
        tracing::info!("Configuring package");
        self.package_configure_command().run()?;

        tracing::info!("Packaging");
        self.package_command().run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchains() -> Toolchains {
        Toolchains {
            ispc_executable: PathBuf::from("/src/deps/ispc-v1.12.0-linux/bin/ispc"),
            tbb_root: PathBuf::from("/src/deps/tbb-2020.1-lin/tbb"),
        }
    }

    fn driver(platform: Platform, config: BuildConfig) -> CMakeDriver {
        CMakeDriver::new(
            "cmake",
            "/src",
            format!("/src/{}", config.build_dir_name()),
            platform,
            config,
        )
    }

    #[test]
    fn test_setup_gcc() {
        let setup = CompilerSetup::new(Platform::Linux, Compiler::Gcc, None).unwrap();
        assert_eq!(
            setup,
            CompilerSetup::Executables {
                cc: PathBuf::from("gcc"),
                cxx: PathBuf::from("g++"),
            }
        );
    }

    #[test]
    fn test_setup_icc_with_install_dir() {
        let dir = Path::new("/opt/intel/bin");
        let setup = CompilerSetup::new(Platform::Linux, Compiler::Icc, Some(dir)).unwrap();
        assert_eq!(
            setup,
            CompilerSetup::Executables {
                cc: dir.join("icc"),
                cxx: dir.join("icpc"),
            }
        );
    }

    #[test]
    fn test_setup_install_dir_ignored_for_clang() {
        let setup =
            CompilerSetup::new(Platform::Macos, Compiler::Clang, Some(Path::new("/opt/intel")))
                .unwrap();
        assert_eq!(
            setup,
            CompilerSetup::Executables {
                cc: PathBuf::from("clang"),
                cxx: PathBuf::from("clang++"),
            }
        );
    }

    #[test]
    fn test_setup_windows_toolsets() {
        assert_eq!(
            CompilerSetup::new(Platform::Windows, Compiler::Msvc, None).unwrap(),
            CompilerSetup::VisualStudio {
                generator: MSVC_GENERATOR,
                toolset: None,
            }
        );
        assert_eq!(
            CompilerSetup::new(Platform::Windows, Compiler::Icc, None).unwrap(),
            CompilerSetup::VisualStudio {
                generator: MSVC_GENERATOR,
                toolset: Some("Intel C++ Compiler 18.0".to_string()),
            }
        );
    }

    #[test]
    fn test_setup_rejects_disallowed_compiler() {
        assert!(CompilerSetup::new(Platform::Windows, Compiler::Gcc, None).is_err());
        assert!(CompilerSetup::new(Platform::Linux, Compiler::Msvc, None).is_err());
        assert!(CompilerSetup::new(Platform::Macos, Compiler::Gcc, None).is_err());
    }

    #[test]
    fn test_configure_command_unix() {
        let driver = driver(Platform::Linux, BuildConfig::Release);
        let setup = CompilerSetup::new(Platform::Linux, Compiler::Clang, None).unwrap();
        let cmd = driver.configure_command(&setup, &toolchains());

        assert_eq!(
            cmd.get_args(),
            [
                "-L",
                "-DCMAKE_C_COMPILER:FILEPATH=clang",
                "-DCMAKE_CXX_COMPILER:FILEPATH=clang++",
                "-DCMAKE_BUILD_TYPE=Release",
                "-DISPC_EXECUTABLE=/src/deps/ispc-v1.12.0-linux/bin/ispc",
                "-DTBB_ROOT=/src/deps/tbb-2020.1-lin/tbb",
                "/src",
            ]
        );
        assert_eq!(cmd.get_cwd(), Some(Path::new("/src/build_release")));
    }

    #[test]
    fn test_configure_command_windows_icc() {
        let driver = driver(Platform::Windows, BuildConfig::Debug);
        let setup = CompilerSetup::new(Platform::Windows, Compiler::Icc, None).unwrap();
        let cmd = driver.configure_command(&setup, &toolchains());

        let args = cmd.get_args();
        assert_eq!(&args[..5], ["-L", "-G", MSVC_GENERATOR, "-T", "Intel C++ Compiler 18.0"]);
        assert!(!args.iter().any(|a| a.starts_with("-DCMAKE_BUILD_TYPE")));
    }

    #[test]
    fn test_configure_command_windows_msvc_has_no_toolset() {
        let driver = driver(Platform::Windows, BuildConfig::Release);
        let setup = CompilerSetup::new(Platform::Windows, Compiler::Msvc, None).unwrap();
        let cmd = driver.configure_command(&setup, &toolchains());

        assert!(!cmd.get_args().iter().any(|a| a == "-T"));
    }

    #[test]
    fn test_build_commands() {
        let unix = driver(Platform::Macos, BuildConfig::RelWithDebInfo);
        assert_eq!(
            unix.build_command().get_args(),
            ["--build", ".", "--target", "preinstall", "-j", "-v"]
        );
        assert_eq!(
            unix.package_command().get_args(),
            ["--build", ".", "--target", "package", "-j", "-v"]
        );

        let windows = driver(Platform::Windows, BuildConfig::RelWithDebInfo);
        assert_eq!(
            windows.build_command().get_args(),
            ["--build", ".", "--config", "RelWithDebInfo", "--target", "ALL_BUILD"]
        );
        assert_eq!(
            windows.package_command().get_args(),
            ["--build", ".", "--config", "RelWithDebInfo", "--target", "PACKAGE"]
        );
    }

    #[test]
    fn test_package_configure_command() {
        let driver = driver(Platform::Linux, BuildConfig::Release);
        let cmd = driver.package_configure_command();

        assert_eq!(cmd.get_args(), ["-L", "-DOIDN_ZIP_MODE=ON", "/src"]);
        assert_eq!(cmd.get_cwd(), Some(Path::new("/src/build_release")));
    }

    #[cfg(unix)]
    #[test]
    fn test_build_recreates_dir_and_fails_on_nonzero_exit() {
        let tmp = tempfile::TempDir::new().unwrap();
        let build_dir = tmp.path().join("build_release");
        std::fs::create_dir(&build_dir).unwrap();
        std::fs::write(build_dir.join("stale"), "old").unwrap();

        // `false` stands in for a cmake that always fails
        let driver = CMakeDriver::new(
            "false",
            tmp.path(),
            &build_dir,
            Platform::Linux,
            BuildConfig::Release,
        );
        let setup = CompilerSetup::new(Platform::Linux, Compiler::Gcc, None).unwrap();
        let err = driver.build(&setup, &toolchains()).unwrap_err();

        assert!(err.to_string().contains("failed with exit code"));
        assert!(build_dir.is_dir());
        assert!(!build_dir.join("stale").exists());
    }
}
