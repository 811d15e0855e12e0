// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transformer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{TransformError, TransformRequest, TransformerAdapter};
use async_trait::async_trait;
use parking_lot::Mutex;
use pq_core::{CropRegion, Device};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Recorded transform invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformCall {
    pub token: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub device: Device,
}

/// Recorded crop invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropCall {
    pub source: PathBuf,
    pub region: CropRegion,
    pub dest: PathBuf,
}

#[derive(Default)]
struct FakeTransformerState {
    calls: Vec<TransformCall>,
    crops: Vec<CropCall>,
    terminated: Vec<String>,
    /// 1-based call numbers that fail
    fail_calls: HashSet<usize>,
    fail_crop: bool,
    terminate_supported: bool,
    delay: Duration,
    in_flight: usize,
    max_in_flight: usize,
}

/// In-memory transformer.
///
/// Never touches the filesystem. Each transform sleeps for the configured
/// delay (tokio time, so paused-clock tests control it) and then succeeds
/// unless its call number was marked failing.
#[derive(Clone, Default)]
pub struct FakeTransformer {
    inner: Arc<Mutex<FakeTransformerState>>,
}

/// Decrements the in-flight count even when the transform future is dropped.
struct InFlight<'a>(&'a Mutex<FakeTransformerState>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

impl FakeTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().delay = delay;
    }

    /// Fail the `n`th transform call (1-based, counted across all photos).
    pub fn fail_call(&self, n: usize) {
        self.inner.lock().fail_calls.insert(n);
    }

    pub fn fail_crop(&self, fail: bool) {
        self.inner.lock().fail_crop = fail;
    }

    pub fn set_terminate_supported(&self, supported: bool) {
        self.inner.lock().terminate_supported = supported;
    }

    pub fn calls(&self) -> Vec<TransformCall> {
        self.inner.lock().calls.clone()
    }

    pub fn crops(&self) -> Vec<CropCall> {
        self.inner.lock().crops.clone()
    }

    pub fn terminated(&self) -> Vec<String> {
        self.inner.lock().terminated.clone()
    }

    /// Highest number of transforms ever executing at once.
    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().max_in_flight
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }
}

#[async_trait]
impl TransformerAdapter for FakeTransformer {
    async fn transform(&self, request: TransformRequest) -> Result<PathBuf, TransformError> {
        let (n, delay, fail) = {
            let mut state = self.inner.lock();
            state.calls.push(TransformCall {
                token: request.token.clone(),
                input: request.input.clone(),
                output: request.output.clone(),
                device: request.device,
            });
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            let n = state.calls.len();
            (n, state.delay, state.fail_calls.contains(&n))
        };
        let _guard = InFlight(&self.inner);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if fail {
            return Err(TransformError::Failed(format!("fake failure on call {n}")));
        }
        Ok(request.output)
    }

    async fn crop(
        &self,
        source: &Path,
        region: CropRegion,
        dest: &Path,
    ) -> Result<(), TransformError> {
        let mut state = self.inner.lock();
        state.crops.push(CropCall {
            source: source.to_path_buf(),
            region,
            dest: dest.to_path_buf(),
        });
        if state.fail_crop {
            return Err(TransformError::Failed("fake crop failure".to_string()));
        }
        Ok(())
    }

    async fn terminate(&self, token: &str) -> Result<bool, TransformError> {
        let mut state = self.inner.lock();
        state.terminated.push(token.to_string());
        Ok(state.terminate_supported)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
