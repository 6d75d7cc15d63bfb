#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for portpatch
//!
//! This crate handles the HTTP side of patch discovery: fetching listing
//! pages and API responses as text or JSON, and downloading patch files.

mod client;
mod download;

pub use client::{NetClient, NetConfig};
pub use download::{Download, DownloadResult};

use portpatch_errors::{Error, NetworkError};
use portpatch_events::EventSender;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Download a file to `dest`, computing its BLAKE3 digest on the way
///
/// # Errors
///
/// Returns an error if the URL is invalid, the request fails, the server
/// answers with a non-success status, or the file cannot be written.
pub async fn download_file(
    client: &NetClient,
    url: &str,
    dest: &Path,
    tx: &EventSender,
) -> Result<DownloadResult, Error> {
    Download::new(url)?.execute(client, dest, tx).await
}

/// Fetch text content from a URL
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error
/// status, or the response body cannot be decoded as text.
pub async fn fetch_text(client: &NetClient, url: &str) -> Result<String, Error> {
    fetch_text_with_headers(client, url, &[]).await
}

/// Fetch text content with extra request headers
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error
/// status, or the response body cannot be decoded as text.
pub async fn fetch_text_with_headers(
    client: &NetClient,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<String, Error> {
    let response = ensure_success(client.get_with_headers(url, headers).await?)?;
    response.text().await.map_err(|e| {
        NetworkError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Fetch and deserialize a JSON document
///
/// # Errors
///
/// Returns an error if the request fails or the body is not valid JSON for `T`.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &NetClient,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<T, Error> {
    let body = fetch_text_with_headers(client, url, headers).await?;
    serde_json::from_str(&body).map_err(|e| {
        NetworkError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

pub(crate) fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status.to_string(),
        }
        .into())
    }
}
