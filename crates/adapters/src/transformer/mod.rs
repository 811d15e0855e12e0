// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transformer adapters: the external engine that processes one photo run.

mod process;

pub use process::ProcessTransformer;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CropCall, FakeTransformer, TransformCall};

use crate::subprocess::SubprocessError;
use async_trait::async_trait;
use pq_core::{CropRegion, Device, Preferences};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from transformer operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("failed to start engine: {0}")]
    Spawn(String),
    #[error("engine exited with {code}: {message}")]
    Exit { code: String, message: String },
    #[error("engine timed out after {0:?}")]
    Timeout(Duration),
    #[error("engine reported success but wrote nothing to {0}")]
    MissingOutput(PathBuf),
    #[error("invalid preferences: {0}")]
    Preferences(String),
    #[error("{0}")]
    Failed(String),
}

impl From<SubprocessError> for TransformError {
    fn from(err: SubprocessError) -> Self {
        match err {
            SubprocessError::Io(msg) => TransformError::Spawn(msg),
            SubprocessError::TimedOut(after) => TransformError::Timeout(after),
        }
    }
}

/// One run handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    /// Opaque handle for `terminate`
    pub token: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub device: Device,
    pub preferences: Preferences,
}

/// Adapter for the image transformation engine
#[async_trait]
pub trait TransformerAdapter: Clone + Send + Sync + 'static {
    /// Process `request.input` into `request.output`, returning the output path.
    async fn transform(&self, request: TransformRequest) -> Result<PathBuf, TransformError>;

    /// Write the `region` of `source` to `dest`.
    async fn crop(
        &self,
        source: &Path,
        region: CropRegion,
        dest: &Path,
    ) -> Result<(), TransformError>;

    /// Ask the engine to abandon the in-flight transform identified by `token`.
    ///
    /// Returns `Ok(false)` when the engine has no way to do so, which is the
    /// default. Dispatched work then runs to completion and its result is
    /// discarded.
    async fn terminate(&self, _token: &str) -> Result<bool, TransformError> {
        Ok(false)
    }
}
