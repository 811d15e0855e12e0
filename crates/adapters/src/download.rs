// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetching remote photos into a local directory.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Rejected URL text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("invalid URL '{0}'")]
    Invalid(String),
    #[error("unsupported URL scheme '{0}' (expected http/https)")]
    UnsupportedScheme(String),
}

/// Errors from download operations
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parse `raw` and accept only http(s).
pub fn parse_http_url(raw: &str) -> Result<Url, UrlError> {
    let parsed = Url::parse(raw).map_err(|_| UrlError::Invalid(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Adapter for fetching a URL to disk
#[async_trait]
pub trait Downloader: Clone + Send + Sync + 'static {
    /// Download `url` into `dest_dir`, returning the written file.
    async fn download(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, DownloadError>;
}

/// File name for a download: the URL basename, or a digest of the URL.
///
/// `content_type` supplies an extension when the basename has none.
pub fn download_file_name(url: &Url, content_type: Option<&str>) -> String {
    let basename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(sanitize)
        .unwrap_or_else(|| {
            let digest = Sha256::digest(url.as_str().as_bytes());
            let hex = format!("{digest:x}");
            format!("download-{}", &hex[..12])
        });

    if Path::new(&basename).extension().is_some() {
        return basename;
    }
    match content_type
        .and_then(|ct| ct.split(';').next())
        .and_then(|ct| mime_guess::get_mime_extensions_str(ct.trim()))
        .and_then(|exts| exts.first())
    {
        Some(ext) => format!("{basename}.{ext}"),
        None => basename,
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Downloader on an async `reqwest` client.
#[derive(Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(crate::env::download_timeout())
            .build()
            .map_err(|e| DownloadError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        let request_error = |e: reqwest::Error| DownloadError::Request {
            url: url.to_string(),
            message: e.to_string(),
        };

        tracing::info!(%url, "downloading");
        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let final_path = dest_dir.join(download_file_name(url, content_type.as_deref()));
        let tmp_path = final_path.with_extension("part");
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| DownloadError::Io { path, source }
        };

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(io_error(dest_dir))?;
        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(io_error(&tmp_path))?;

        let written = async {
            while let Some(chunk) = response.chunk().await.map_err(request_error)? {
                file.write_all(&chunk).await.map_err(io_error(&tmp_path))?;
            }
            file.flush().await.map_err(io_error(&tmp_path))?;
            file.sync_all().await.map_err(io_error(&tmp_path))?;
            Ok::<(), DownloadError>(())
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(io_error(&final_path))?;
        tracing::info!(%url, path = %final_path.display(), "download finished");
        Ok(final_path)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeDownloaderState {
        bodies: HashMap<String, Vec<u8>>,
        calls: Vec<String>,
    }

    /// Serves registered bodies; anything else is a 404.
    #[derive(Clone, Default)]
    pub struct FakeDownloader {
        inner: Arc<Mutex<FakeDownloaderState>>,
    }

    impl FakeDownloader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
            self.inner
                .lock()
                .bodies
                .insert(url.to_string(), body.into());
        }

        /// URLs requested so far
        pub fn calls(&self) -> Vec<String> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn download(&self, url: &Url, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
            let body = {
                let mut state = self.inner.lock();
                state.calls.push(url.to_string());
                state.bodies.get(url.as_str()).cloned()
            };
            let Some(body) = body else {
                return Err(DownloadError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            };

            let path = dest_dir.join(download_file_name(url, None));
            let io_error = |source| DownloadError::Io {
                path: path.clone(),
                source,
            };
            tokio::fs::create_dir_all(dest_dir)
                .await
                .map_err(io_error)?;
            tokio::fs::write(&path, body).await.map_err(io_error)?;
            Ok(path)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDownloader;

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
