//! oidn-release - Release builder and packager for Intel Open Image Denoise
//!
//! This crate provides the release pipeline: provisioning the pinned ISPC
//! and TBB toolchains, driving CMake, post-processing the package archive,
//! checking symbol versions of Linux binaries and signing.

pub mod archive;
pub mod builder;
pub mod compat;
pub mod core;
pub mod deps;
pub mod ops;
pub mod package;
pub mod sign;
pub mod util;

/// Test utilities: a recording downloader and archive fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{BuildConfig, Compiler, Platform, Stage};
pub use ops::{release, ReleaseOptions, ReleaseResult};
pub use util::context::GlobalContext;
