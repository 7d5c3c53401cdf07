//! Binary compatibility check for Linux releases.
//!
//! Release binaries must load on distributions older than the build host.
//! Every dynamic symbol versioned against glibc, libstdc++ or the C++ ABI
//! library must not require a newer version than the baseline below.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;

use crate::util::fs::file_name_str;
use crate::util::process::ProcessBuilder;

/// Compatibility check failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompatError {
    #[error("problematic symbol {symbol} in {binary} (requires {scheme} {version}, maximum is {max})")]
    Violation {
        symbol: String,
        binary: String,
        scheme: SymbolScheme,
        version: SymbolVersion,
        max: SymbolVersion,
    },
}

/// A dotted numeric version, compared component by component.
///
/// Missing trailing components count as zero, so `2.17` equals `2.17.0`.
#[derive(Debug, Clone, Eq)]
pub struct SymbolVersion(Vec<u32>);

impl SymbolVersion {
    pub fn new(components: impl Into<Vec<u32>>) -> Self {
        SymbolVersion(components.into())
    }
}

impl Ord for SymbolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SymbolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SymbolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl FromStr for SymbolVersion {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('.')
            .map(str::parse)
            .collect::<Result<Vec<u32>, _>>()
            .map(SymbolVersion)
    }
}

impl fmt::Display for SymbolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// Symbol versioning schemes with a compatibility baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScheme {
    /// GNU C library (`GLIBC_x.y`)
    Glibc,
    /// GNU C++ standard library (`GLIBCXX_x.y.z`)
    Glibcxx,
    /// C++ ABI support library (`CXXABI_x.y.z`)
    Cxxabi,
}

impl SymbolScheme {
    pub const ALL: [SymbolScheme; 3] = [
        SymbolScheme::Glibc,
        SymbolScheme::Glibcxx,
        SymbolScheme::Cxxabi,
    ];

    /// Version tag prefix as it appears after `@`.
    pub fn label(&self) -> &'static str {
        match self {
            SymbolScheme::Glibc => "GLIBC",
            SymbolScheme::Glibcxx => "GLIBCXX",
            SymbolScheme::Cxxabi => "CXXABI",
        }
    }

    /// Newest version a release binary may require.
    pub fn max_version(&self) -> SymbolVersion {
        match self {
            SymbolScheme::Glibc => SymbolVersion::new([2, 17, 0]),
            SymbolScheme::Glibcxx => SymbolVersion::new([3, 4, 19]),
            SymbolScheme::Cxxabi => SymbolVersion::new([1, 3, 7]),
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for SymbolScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A symbol with a tracked version tag, e.g. `memcpy@GLIBC_2.14`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSymbol {
    pub symbol: String,
    pub scheme: SymbolScheme,
    pub version: SymbolVersion,
}

impl VersionedSymbol {
    /// Whether the symbol requires more than the scheme's baseline.
    pub fn exceeds_baseline(&self) -> bool {
        self.version > self.scheme.max_version()
    }
}

static VERSIONED_SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@@?(GLIBC|GLIBCXX|CXXABI)_([0-9]+(?:\.[0-9]+)*)$").expect("valid regex")
});

/// Extract tracked versioned symbols from `nm` output.
///
/// Tokens without a tracked numeric version tag (including
/// `GLIBC_PRIVATE`) are ignored.
pub fn parse_symbols(nm_output: &str) -> Vec<VersionedSymbol> {
    nm_output
        .split_whitespace()
        .filter_map(|token| {
            let caps = VERSIONED_SYMBOL.captures(token)?;
            let scheme = SymbolScheme::from_label(&caps[1])?;
            let version = caps[2].parse().ok()?;
            Some(VersionedSymbol {
                symbol: token.to_string(),
                scheme,
                version,
            })
        })
        .collect()
}

/// Fail on the first symbol that exceeds its scheme's baseline.
pub fn check_symbols(symbols: &[VersionedSymbol], binary: &str) -> Result<(), CompatError> {
    match symbols.iter().find(|s| s.exceeds_baseline()) {
        Some(s) => Err(CompatError::Violation {
            symbol: s.symbol.clone(),
            binary: binary.to_string(),
            scheme: s.scheme,
            version: s.version.clone(),
            max: s.scheme.max_version(),
        }),
        None => Ok(()),
    }
}

/// Reads dynamic symbol tables with `nm` and checks them.
#[derive(Debug, Clone)]
pub struct SymbolChecker {
    nm: PathBuf,
}

impl SymbolChecker {
    pub fn new(nm: impl Into<PathBuf>) -> Self {
        SymbolChecker { nm: nm.into() }
    }

    /// Dynamic symbols of `binary` with a tracked version tag.
    pub fn read_symbols(&self, binary: &Path) -> Result<Vec<VersionedSymbol>> {
        let output = ProcessBuilder::new(&self.nm)
            .arg("-D")
            .arg(binary)
            .exec_and_check()
            .with_context(|| format!("failed to read symbols of {}", binary.display()))?;
        Ok(parse_symbols(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Check one binary against the baselines.
    pub fn check(&self, binary: &Path) -> Result<()> {
        tracing::info!("Checking symbols: {}", binary.display());
        let symbols = self.read_symbols(binary)?;
        tracing::debug!("{} versioned symbols in {}", symbols.len(), binary.display());
        check_symbols(&symbols, file_name_str(binary)?)?;
        Ok(())
    }
}
