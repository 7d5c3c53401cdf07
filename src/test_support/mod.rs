//! Test utilities: a recording downloader and archive/tree fixtures.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use url::Url;
use walkdir::WalkDir;

use crate::deps::Downloader;

/// Downloader that serves local files and counts requests.
///
/// Unknown URLs fail as if the server returned 404.
#[derive(Debug, Default)]
pub struct MockDownloader {
    files: HashMap<String, PathBuf>,
    calls: Cell<usize>,
    requested: RefCell<Vec<String>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `file` when `url` is requested.
    pub fn serve(mut self, url: &str, file: &Path) -> Self {
        self.files.insert(url.to_string(), file.to_path_buf());
        self
    }

    /// Number of download calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl Downloader for MockDownloader {
    fn download(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf> {
        self.calls.set(self.calls.get() + 1);
        self.requested.borrow_mut().push(url.to_string());

        let Some(source) = self.files.get(url.as_str()) else {
            bail!("failed to download {}: HTTP 404 Not Found", url);
        };

        let name = crate::deps::download::url_file_name(url)?;
        let dest = dest_dir.join(name);
        fs::copy(source, &dest)?;
        Ok(dest)
    }
}

/// Write files (creating parent directories) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
    }
}

fn append_tar_entries<W: Write>(builder: &mut tar::Builder<W>, files: &[(&str, &[u8])]) {
    for (rel, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(rel).unwrap();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append(&header, *contents).unwrap();
    }
}

/// Write an uncompressed tarball containing `files`.
pub fn write_tar(path: &Path, files: &[(&str, &[u8])]) {
    let mut builder = tar::Builder::new(File::create(path).unwrap());
    append_tar_entries(&mut builder, files);
    builder.finish().unwrap();
}

/// Write a gzip-compressed tarball containing `files`.
pub fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_tar_entries(&mut builder, files);
    builder.into_inner().unwrap().finish().unwrap();
}

/// Write a zip archive containing `files`.
pub fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (rel, contents) in files {
        writer
            .start_file(*rel, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
}

/// Map of relative path to file contents (`None` for directories).
fn snapshot(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let contents = if entry.file_type().is_file() {
                Some(fs::read(entry.path()).unwrap())
            } else {
                None
            };
            (rel, contents)
        })
        .collect()
}

/// Assert two directory trees hold the same paths and file contents.
pub fn assert_same_tree(expected: &Path, actual: &Path) {
    assert_eq!(snapshot(expected), snapshot(actual));
}
