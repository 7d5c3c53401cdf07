//! Global context for release operations.
//!
//! Provides centralized access to the source root, the detected platform,
//! the loaded configuration and the process environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{BuildConfig, Platform};
use crate::util::config::{project_config_path, Config};

/// Prefix of every environment variable the release tool reads.
pub const ENV_PREFIX: &str = "OIDN";

/// Shared state for one release run.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Source root containing the top-level CMakeLists.txt
    root: PathBuf,

    /// Host platform
    platform: Platform,

    /// Loaded configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_root(cwd)
    }

    /// Create a context rooted at `root`, loading its project config.
    ///
    /// A relative `root` is resolved against the current directory.
    pub fn with_root(root: PathBuf) -> Result<Self> {
        let root = std::path::absolute(&root)
            .with_context(|| format!("failed to resolve source root: {}", root.display()))?;
        let platform = Platform::detect()?;
        let config = Config::load_or_default(&project_config_path(&root));
        Ok(GlobalContext {
            root,
            platform,
            config,
        })
    }

    /// Override the platform and config explicitly.
    pub fn from_parts(root: PathBuf, platform: Platform, config: Config) -> Self {
        GlobalContext {
            root,
            platform,
            config,
        }
    }

    /// Get the source root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the host platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Get the dependency cache directory.
    pub fn deps_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.deps)
    }

    /// Get the build directory for a configuration (`build_<config>`).
    pub fn build_dir(&self, config: BuildConfig) -> PathBuf {
        self.root.join(config.build_dir_name())
    }

    /// Name of a platform-scoped variable, e.g. `OIDN_ICC_DIR_LINUX`.
    pub fn env_var_name(&self, name: &str) -> String {
        platform_env_var(name, self.platform)
    }

    /// Read a platform-scoped environment variable. Empty values count as unset.
    pub fn env_var(&self, name: &str) -> Option<String> {
        let key = self.env_var_name(name);
        match std::env::var(&key) {
            Ok(value) if !value.is_empty() => {
                tracing::debug!("{} = {}", key, value);
                Some(value)
            }
            _ => None,
        }
    }
}

/// Build `<PREFIX>_<NAME>_<PLATFORM>`.
pub fn platform_env_var(name: &str, platform: Platform) -> String {
    format!("{}_{}_{}", ENV_PREFIX, name, platform.env_suffix())
}
