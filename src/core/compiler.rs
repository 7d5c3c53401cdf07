//! Compiler choices.

use std::fmt;
use std::str::FromStr;

use super::PlatformError;

/// Compiler family a release can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compiler {
    /// Microsoft Visual C++ (Windows only)
    Msvc,
    /// Intel C++ Compiler
    Icc,
    /// GNU Compiler Collection
    Gcc,
    /// Clang/LLVM
    Clang,
}

impl Compiler {
    /// Compiler name as used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Msvc => "msvc",
            Compiler::Icc => "icc",
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
        }
    }

    /// C and C++ driver executables for Makefile-style generators.
    ///
    /// MSVC is only driven through a Visual Studio generator and has no pair.
    pub fn executables(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Compiler::Gcc => Some(("gcc", "g++")),
            Compiler::Clang => Some(("clang", "clang++")),
            Compiler::Icc => Some(("icc", "icpc")),
            Compiler::Msvc => None,
        }
    }

    /// Name of the environment variable holding a vendor installation
    /// directory, for compilers that are not expected on PATH.
    pub fn install_dir_var(&self) -> Option<&'static str> {
        match self {
            Compiler::Icc => Some("ICC_DIR"),
            Compiler::Msvc | Compiler::Gcc | Compiler::Clang => None,
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compiler {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msvc" => Ok(Compiler::Msvc),
            "icc" => Ok(Compiler::Icc),
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            other => Err(PlatformError::UnknownCompiler(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for compiler in [Compiler::Msvc, Compiler::Icc, Compiler::Gcc, Compiler::Clang] {
            assert_eq!(compiler.as_str().parse::<Compiler>(), Ok(compiler));
        }
        assert!("cl".parse::<Compiler>().is_err());
        assert!("GCC".parse::<Compiler>().is_err());
    }

    #[test]
    fn test_executables() {
        assert_eq!(Compiler::Gcc.executables(), Some(("gcc", "g++")));
        assert_eq!(Compiler::Clang.executables(), Some(("clang", "clang++")));
        assert_eq!(Compiler::Icc.executables(), Some(("icc", "icpc")));
        assert_eq!(Compiler::Msvc.executables(), None);
    }

    #[test]
    fn test_only_icc_needs_install_dir() {
        assert_eq!(Compiler::Icc.install_dir_var(), Some("ICC_DIR"));
        assert_eq!(Compiler::Gcc.install_dir_var(), None);
        assert_eq!(Compiler::Clang.install_dir_var(), None);
    }
}
