//! Build tool drivers.

pub mod cmake;

pub use cmake::{CMakeDriver, CompilerSetup};
