// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the photo engine

use pq_adapters::{DownloadError, FileError, TransformError, UrlError};
use pq_core::CropRegion;
use std::path::PathBuf;
use thiserror::Error;

/// Rejected input. Nothing was queued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),
    #[error("unsupported file type {mime} for {path}")]
    UnsupportedType { path: PathBuf, mime: String },
    #[error("manual crop mode needs a crop region")]
    MissingCropRegion,
    #[error("crop region {0} has no area")]
    EmptyCropRegion(CropRegion),
    #[error(transparent)]
    Url(#[from] UrlError),
}

/// Errors that can occur in the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),
    #[error(transparent)]
    File(#[from] FileError),
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
    #[error("failed to list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("run {0} not found")]
    RunNotFound(usize),
    #[error("run {0} is already queued or running")]
    RunActive(usize),
}
