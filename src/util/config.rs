//! Configuration file support.
//!
//! An optional project file at `.oidn-release/config.toml` overrides tool
//! locations, the dependency cache directory and network behavior. Command
//! line flags take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Release tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool locations
    pub tools: ToolsConfig,

    /// Directory layout
    pub paths: PathsConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Paths to external tools. Unset tools are looked up on PATH.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Path to cmake
    pub cmake: Option<PathBuf>,

    /// Path to nm, used for the symbol version check
    pub nm: Option<PathBuf>,
}

/// Directory layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Dependency cache directory, relative to the source root
    pub deps: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            deps: PathBuf::from("deps"),
        }
    }
}

/// Network settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Fail instead of downloading missing dependencies
    pub offline: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }
}

/// Get the project config path (`.oidn-release/config.toml`).
pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(".oidn-release").join("config.toml")
}
