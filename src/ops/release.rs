//! The release pipeline: provision, build, package, check, sign.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::builder::cmake::{CMakeDriver, CompilerSetup};
use crate::compat::SymbolChecker;
use crate::core::{BuildConfig, Compiler, Platform, Stage};
use crate::deps::{Downloader, Provisioner};
use crate::package::{PackageOutcome, Packager};
use crate::sign::Signer;
use crate::util::fs::ensure_dir;
use crate::util::process::resolve_tool;
use crate::util::GlobalContext;

/// Options for a release run.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Stages to run; they always execute in pipeline order
    pub stages: Vec<Stage>,

    /// Requested compiler (platform default when `None`)
    pub compiler: Option<Compiler>,

    /// Build configuration
    pub config: BuildConfig,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        ReleaseOptions {
            stages: vec![Stage::Build],
            compiler: None,
            config: BuildConfig::default(),
        }
    }
}

/// Result of a release run.
#[derive(Debug, Clone)]
pub struct ReleaseResult {
    /// Build directory used
    pub build_dir: PathBuf,

    /// Package produced by the package stage, if it ran
    pub package: Option<PackageOutcome>,
}

/// Run the requested stages.
pub fn release(
    ctx: &GlobalContext,
    opts: &ReleaseOptions,
    downloader: &dyn Downloader,
) -> Result<ReleaseResult> {
    let platform = ctx.platform();
    let compiler = platform.select_compiler(opts.compiler)?;
    let build_dir = ctx.build_dir(opts.config);

    tracing::info!(
        "Release on {} with {} ({}): {}",
        platform,
        compiler,
        opts.config,
        opts.stages
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    ensure_dir(&ctx.deps_dir())?;

    let cmake = resolve_tool(ctx.config().tools.cmake.as_deref(), "cmake")?;
    let driver = CMakeDriver::new(cmake, ctx.root(), &build_dir, platform, opts.config);

    if opts.stages.contains(&Stage::Build) {
        build(ctx, &driver, compiler, downloader)?;
    }

    let package = if opts.stages.contains(&Stage::Package) {
        Some(package(ctx, &driver)?)
    } else {
        None
    };

    Ok(ReleaseResult { build_dir, package })
}

/// Provision dependencies, then configure and compile from scratch.
fn build(
    ctx: &GlobalContext,
    driver: &CMakeDriver,
    compiler: Compiler,
    downloader: &dyn Downloader,
) -> Result<()> {
    let platform = ctx.platform();

    let toolchains = Provisioner::new(ctx.deps_dir(), platform, downloader)
        .offline(ctx.config().net.offline)
        .provision_all()?;

    let install_dir = compiler
        .install_dir_var()
        .and_then(|var| ctx.env_var(var))
        .map(PathBuf::from);
    if let Some(dir) = &install_dir {
        tracing::info!("Using {} from {}", compiler, dir.display());
    }

    let setup = CompilerSetup::new(platform, compiler, install_dir.as_deref())?;
    driver.build(&setup, &toolchains)
}

/// Package, check and optionally sign.
fn package(ctx: &GlobalContext, driver: &CMakeDriver) -> Result<PackageOutcome> {
    let platform = ctx.platform();

    if !driver.build_dir().is_dir() {
        bail!(
            "build directory {} does not exist\n\
             \n\
             Run the `build` stage first.",
            driver.build_dir().display()
        );
    }

    driver.package()?;

    let checker = symbol_checker(ctx, platform)?;
    let signer = Signer::from_env(ctx);
    if signer.is_none() {
        tracing::info!(
            "{} is not set, package will not be signed",
            ctx.env_var_name(crate::sign::SIGN_FILE_VAR)
        );
    }

    Packager::new(driver.build_dir(), platform)
        .with_checker(checker)
        .with_signer(signer)
        .finish()
}

/// Symbol versions are only checked for Linux releases.
fn symbol_checker(ctx: &GlobalContext, platform: Platform) -> Result<Option<SymbolChecker>> {
    match platform {
        Platform::Linux => {
            let nm = resolve_tool(ctx.config().tools.nm.as_deref(), "nm")?;
            Ok(Some(SymbolChecker::new(nm)))
        }
        Platform::Windows | Platform::Macos => Ok(None),
    }
}
