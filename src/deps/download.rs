//! HTTP downloads of toolchain archives.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// Fetches a URL into a directory.
pub trait Downloader {
    /// Download `url` into `dest_dir`, returning the path of the written file.
    fn download(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf>;
}

/// Blocking HTTP(S) downloader with a progress bar. No timeout is applied.
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("oidn-release/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<std::time::Duration>)
            .build()
            .context("failed to create HTTP client")?;
        Ok(HttpDownloader { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf> {
        tracing::info!("Downloading file: {}", url);

        let dest = dest_dir.join(url_file_name(url)?);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("failed to download {}", url))?;

        if !response.status().is_success() {
            bail!("failed to download {}: HTTP {}", url, response.status());
        }

        let progress = match response.content_length() {
            Some(len) => ProgressBar::new(len).with_style(
                ProgressStyle::with_template(
                    "{spinner} {msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            ),
            None => ProgressBar::new_spinner(),
        };
        progress.set_message(url_file_name(url)?.to_string());

        let file = File::create(&dest)
            .with_context(|| format!("failed to create file: {}", dest.display()))?;
        let mut writer = progress.wrap_write(BufWriter::new(file));

        io::copy(&mut response, &mut writer)
            .with_context(|| format!("failed to write {}", dest.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to write {}", dest.display()))?;
        progress.finish_and_clear();

        tracing::debug!(
            "Downloaded {} (sha256 {})",
            dest.display(),
            crate::util::hash::sha256_file(&dest)?
        );

        Ok(dest)
    }
}

/// Last path segment of a download URL.
pub fn url_file_name(url: &Url) -> Result<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .with_context(|| format!("download URL has no file name: {}", url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_file_name() {
        let url = Url::parse(
            "https://github.com/ispc/ispc/releases/download/v1.12.0/ispc-v1.12.0b-linux.tar.gz",
        )
        .unwrap();
        assert_eq!(url_file_name(&url).unwrap(), "ispc-v1.12.0b-linux.tar.gz");
    }

    #[test]
    fn test_url_file_name_missing() {
        let url = Url::parse("https://example.com/releases/").unwrap();
        assert!(url_file_name(&url).is_err());
    }
}
