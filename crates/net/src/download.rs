//! File download with digest computation

use futures::StreamExt;
use portpatch_errors::{Error, NetworkError};
use portpatch_events::{DownloadEvent, EventEmitter, EventSender, FailureContext};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::{ensure_success, NetClient};

/// Download operation handle
pub struct Download {
    url: Url,
}

/// Result of a download operation
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub url: String,
    pub path: PathBuf,
    pub size: u64,
    /// BLAKE3 digest, hex encoded
    pub digest: String,
}

impl Download {
    /// Create a new download
    ///
    /// # Errors
    ///
    /// Returns an error if the provided URL is invalid or cannot be parsed.
    pub fn new(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        Ok(Self { url })
    }

    /// Execute the download
    ///
    /// The body is streamed into `<dest>.part` and renamed into place once
    /// complete, so `dest` either holds the full file or does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server returns an error
    /// status, or the file cannot be written.
    pub async fn execute(
        self,
        client: &NetClient,
        dest: &Path,
        tx: &EventSender,
    ) -> Result<DownloadResult, Error> {
        let url_str = self.url.to_string();
        tx.emit_download(DownloadEvent::Started {
            url: url_str.clone(),
        });

        let result = Self::transfer(client, &url_str, dest).await;
        match &result {
            Ok(done) => tx.emit_download(DownloadEvent::Completed {
                url: url_str,
                bytes: done.size,
            }),
            Err(e) => tx.emit_download(DownloadEvent::Failed {
                url: url_str,
                failure: FailureContext::from_error(e),
            }),
        }
        result
    }

    async fn transfer(client: &NetClient, url: &str, dest: &Path) -> Result<DownloadResult, Error> {
        let response = ensure_success(client.get(url).await?)?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_path(&e, parent))?;
        }

        let temp_path = part_path(dest);
        let written = match store(response, &temp_path, dest).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(remove) = tokio::fs::remove_file(&temp_path).await {
                    if remove.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %temp_path.display(), error = %remove, "could not remove partial download");
                    }
                }
                return Err(e);
            }
        };
        debug!(url, path = %dest.display(), bytes = written.0, "download complete");

        Ok(DownloadResult {
            url: url.to_string(),
            path: dest.to_path_buf(),
            size: written.0,
            digest: written.1,
        })
    }
}

/// Stream the body into `path` and rename it to `dest`
///
/// Returns the size and hex BLAKE3 digest of the body.
async fn store(response: reqwest::Response, path: &Path, dest: &Path) -> Result<(u64, String), Error> {
    let mut file = File::create(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;

    let mut stream = response.bytes_stream();
    let mut downloaded = 0u64;
    let mut hasher = blake3::Hasher::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        hasher.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| Error::io_with_path(&e, path))?;
    drop(file);

    tokio::fs::rename(path, dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;

    Ok((downloaded, hasher.finalize().to_hex().to_string()))
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download").field("url", &self.url.as_str()).finish()
    }
}
