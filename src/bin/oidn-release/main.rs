//! oidn-release CLI - builds and packages Open Image Denoise releases

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use oidn_release::deps::HttpDownloader;
use oidn_release::{release, GlobalContext, ReleaseOptions};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("oidn_release=debug")
        } else {
            EnvFilter::new("oidn_release=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = match cli.root {
        Some(root) => GlobalContext::with_root(root)?,
        None => GlobalContext::new()?,
    };
    if cli.offline {
        ctx.config_mut().net.offline = true;
    }

    let opts = ReleaseOptions {
        stages: cli.stages,
        compiler: Some(cli.compiler),
        config: cli.config,
    };

    let downloader = HttpDownloader::new()?;
    let result = release(&ctx, &opts, &downloader)?;

    match &result.package {
        Some(package) => eprintln!(
            "    Finished {} ({})",
            package.archive.display(),
            if package.signed { "signed" } else { "unsigned" }
        ),
        None => eprintln!("    Finished build in {}", result.build_dir.display()),
    }

    Ok(())
}
