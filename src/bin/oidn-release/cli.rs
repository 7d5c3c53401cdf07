//! CLI definitions using clap.

use std::path::PathBuf;

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::Parser;

use oidn_release::{BuildConfig, Compiler, Stage};

/// Intel(R) Open Image Denoise - Release
#[derive(Parser)]
#[command(name = "oidn-release")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Stages to run
    #[arg(
        value_name = "STAGE",
        default_value = "build",
        value_parser = PossibleValuesParser::new(["build", "package"])
            .try_map(|s| s.parse::<Stage>())
    )]
    pub stages: Vec<Stage>,

    /// Compiler
    #[arg(
        long,
        default_value = "icc",
        value_parser = PossibleValuesParser::new(["msvc", "icc", "gcc", "clang"])
            .try_map(|s| s.parse::<Compiler>())
    )]
    pub compiler: Compiler,

    /// Build configuration
    #[arg(
        long,
        default_value = "Release",
        value_parser = PossibleValuesParser::new(["Debug", "Release", "RelWithDebInfo"])
            .try_map(|s| s.parse::<BuildConfig>())
    )]
    pub config: BuildConfig,

    /// Source root containing CMakeLists.txt (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Fail instead of downloading missing dependencies
    #[arg(long)]
    pub offline: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
