//! Reading and writing release archives.
//!
//! Toolchain downloads arrive as `.tar.gz`, `.tgz` or `.zip`; packages are
//! produced by CPack as `.tar.gz` or `.zip` and may be rebuilt after signing.

pub mod create;
pub mod extract;
pub mod format;

pub use create::create_archive;
pub use extract::extract_archive;
pub use format::{strip_archive_suffix, ArchiveError, ArchiveFormat};
