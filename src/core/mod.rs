//! Core data types: platforms, compilers, configurations and stages.

pub mod build_config;
pub mod compiler;
pub mod platform;

pub use build_config::{BuildConfig, Stage};
pub use compiler::Compiler;
pub use platform::{Platform, PlatformError};
