//! Code signing of packaged binaries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::process::ProcessBuilder;
use crate::util::GlobalContext;

/// Name of the platform-scoped variable holding the signing tool path.
pub const SIGN_FILE_VAR: &str = "SIGN_FILE";

/// Runs an external signing tool on each binary.
#[derive(Debug, Clone)]
pub struct Signer {
    program: PathBuf,
}

impl Signer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Signer {
            program: program.into(),
        }
    }

    /// Signer configured through `OIDN_SIGN_FILE_<PLATFORM>`, if set.
    pub fn from_env(ctx: &GlobalContext) -> Option<Self> {
        ctx.env_var(SIGN_FILE_VAR).map(Signer::new)
    }

    /// Command signing one file.
    pub fn sign_command(&self, file: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .args(["-q", "-vv"])
            .arg(file)
    }

    /// Sign one file.
    pub fn sign(&self, file: &Path) -> Result<()> {
        tracing::info!("Signing {}", file.display());
        self.sign_command(file)
            .run()
            .with_context(|| format!("failed to sign {}", file.display()))
    }

    /// Sign every file, stopping at the first failure.
    pub fn sign_all(&self, files: &[PathBuf]) -> Result<()> {
        files.iter().try_for_each(|file| self.sign(file))
    }
}
