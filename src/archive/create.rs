//! Archive creation.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::format::{ArchiveError, ArchiveFormat};
use crate::util::fs::file_name_str;

/// Create `filename` from `input_dir`.
///
/// The archive holds a single root entry named after `input_dir`. Only
/// `.tar.gz` and `.zip` outputs are produced.
pub fn create_archive(filename: &Path, input_dir: &Path) -> Result<()> {
    let format = ArchiveFormat::from_path(filename)?;
    let root_name = file_name_str(input_dir)?;
    tracing::info!("Creating package: {}", filename.display());

    let result = match format {
        ArchiveFormat::TarGz => create_tar_gz(filename, input_dir, root_name),
        ArchiveFormat::Zip => create_zip(filename, input_dir, root_name),
        ArchiveFormat::Tar | ArchiveFormat::TarZst => {
            return Err(ArchiveError::UnsupportedFormat(filename.to_path_buf()).into())
        }
    };

    result.with_context(|| format!("failed to create {}", filename.display()))
}

fn create_tar_gz(filename: &Path, input_dir: &Path, root_name: &str) -> Result<()> {
    let file = File::create(filename)
        .with_context(|| format!("failed to create file: {}", filename.display()))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder
        .append_dir_all(root_name, input_dir)
        .with_context(|| format!("failed to add {} to tarball", input_dir.display()))?;

    let encoder = builder.into_inner().context("failed to finish tarball")?;
    encoder.finish().context("failed to finish gzip stream")?;
    Ok(())
}

fn create_zip(filename: &Path, input_dir: &Path, root_name: &str) -> Result<()> {
    let file = File::create(filename)
        .with_context(|| format!("failed to create file: {}", filename.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    for entry in WalkDir::new(input_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", input_dir.display()))?;
        let path = entry.path();
        let relative = path.strip_prefix(input_dir)?;
        let name = zip_entry_name(root_name, relative);

        let metadata = fs::symlink_metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(unix_mode(&metadata));

        let file_type = entry.file_type();
        if file_type.is_dir() {
            writer.add_directory(name.as_str(), options)?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(path)
                .with_context(|| format!("failed to read symlink {}", path.display()))?;
            writer.add_symlink(
                name.as_str(),
                target.to_string_lossy().replace('\\', "/"),
                options,
            )?;
        } else {
            writer.start_file(name.as_str(), options)?;
            let mut source =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            io::copy(&mut source, &mut writer)
                .with_context(|| format!("failed to compress {}", path.display()))?;
        }
    }

    writer.finish().context("failed to finish zip")?;
    Ok(())
}

/// Zip entry names always use forward slashes.
fn zip_entry_name(root_name: &str, relative: &Path) -> String {
    let mut name = root_name.to_string();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn unix_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else {
        0o644
    }
}
