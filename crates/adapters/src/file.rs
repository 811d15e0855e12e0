// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source file identity: existence, type and content hash.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncReadExt;

const HASH_CHUNK: usize = 64 * 1024;

/// MIME types the engine accepts.
pub const SUPPORTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A submitted source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    path: PathBuf,
}

impl PhotoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn is_dir(&self) -> bool {
        self.path.is_dir()
    }

    /// File name for display, falling back to the full path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Lower-cased extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// MIME type guessed from the extension.
    pub fn mime(&self) -> Option<&'static str> {
        mime_guess::from_path(&self.path).first_raw()
    }

    pub fn is_supported(&self) -> bool {
        self.mime()
            .is_some_and(|mime| SUPPORTED_MIME_TYPES.contains(&mime))
    }

    /// Hex SHA-256 of the file contents, read in chunks.
    pub async fn hash(&self) -> Result<String, FileError> {
        let read_error = |source| FileError::Read {
            path: self.path.clone(),
            source,
        };
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(read_error)?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; HASH_CHUNK];
        loop {
            let n = file.read(&mut buf).await.map_err(read_error)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
