//! High-level operations.

pub mod release;

pub use release::{release, ReleaseOptions, ReleaseResult};
