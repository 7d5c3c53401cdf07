//! Archive extraction.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

use super::format::ArchiveFormat;
use crate::util::fs::ensure_dir;

/// Extract an archive into `dest`.
///
/// The format is chosen by [`ArchiveFormat::from_path`]; anything else is an
/// `UnsupportedFormat` error. Entries that would escape `dest` are never
/// written outside it.
pub fn extract_archive(path: &Path, dest: &Path) -> Result<()> {
    let format = ArchiveFormat::from_path(path)?;
    tracing::info!("Extracting archive: {}", path.display());

    ensure_dir(dest)?;

    let file =
        File::open(path).with_context(|| format!("failed to open archive: {}", path.display()))?;
    let reader = BufReader::new(file);

    let result = match format {
        ArchiveFormat::Tar => unpack_tar(reader, dest),
        ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(reader), dest),
        ArchiveFormat::TarZst => zstd::stream::read::Decoder::with_buffer(reader)
            .context("failed to initialize zstd decoder")
            .and_then(|decoder| unpack_tar(decoder, dest)),
        ArchiveFormat::Zip => unpack_zip(reader, dest),
    };

    result.with_context(|| format!("failed to extract {}", path.display()))
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive
        .unpack(dest)
        .with_context(|| format!("failed to unpack tarball into {}", dest.display()))
}

fn unpack_zip(reader: BufReader<File>, dest: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(reader).context("failed to open zip")?;
    archive
        .extract(dest)
        .with_context(|| format!("failed to unpack zip into {}", dest.display()))
}
