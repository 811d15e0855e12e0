// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub title: String,
    pub message: String,
}

#[derive(Default)]
struct FakeNotifyState {
    calls: Vec<NotifyCall>,
    focused: bool,
    fail: bool,
}

/// Records notices; focus and failure are switchable.
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    inner: Arc<Mutex<FakeNotifyState>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_focused(&self, focused: bool) {
        self.inner.lock().focused = focused;
    }

    /// Make every subsequent `notify` return an error (still recorded).
    pub fn set_failing(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let mut inner = self.inner.lock();
        inner.calls.push(NotifyCall {
            title: title.to_string(),
            message: message.to_string(),
        });
        if inner.fail {
            return Err(NotifyError::SendFailed("fake failure".to_string()));
        }
        Ok(())
    }

    fn app_focused(&self) -> bool {
        self.inner.lock().focused
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
