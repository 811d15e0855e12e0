// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One execution attempt of a photo through the transformer.

use crate::queue::{QueueTask, TaskError};
use async_trait::async_trait;
use parking_lot::Mutex;
use pq_adapters::{TransformRequest, TransformerAdapter};
use pq_core::{Clock, PhotoId, RunStatus, Stopwatch, SHORT_ID_LEN};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

struct RunState {
    status: RunStatus,
    output: Option<PathBuf>,
    error: Option<String>,
    cancel_requested: bool,
    stopwatch: Stopwatch,
}

/// A work unit owned by a [`Photo`](crate::Photo).
///
/// Lifecycle hooks are driven by the photo's run queue; `cancel` may be
/// called from anywhere.
pub struct Run<T: TransformerAdapter, C: Clock> {
    index: usize,
    photo: PhotoId,
    request: TransformRequest,
    transformer: T,
    clock: C,
    state: Mutex<RunState>,
}

impl<T: TransformerAdapter, C: Clock> Run<T, C> {
    pub(crate) fn new(
        index: usize,
        photo: PhotoId,
        request: TransformRequest,
        transformer: T,
        clock: C,
    ) -> Self {
        Self {
            index,
            photo,
            request,
            transformer,
            clock,
            state: Mutex::new(RunState {
                status: RunStatus::Pending,
                output: None,
                error: None,
                cancel_requested: false,
                stopwatch: Stopwatch::new(),
            }),
        }
    }

    /// 1-based position within the photo's cycle
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn photo_id(&self) -> &PhotoId {
        &self.photo
    }

    /// Handle passed to the engine for `terminate`
    pub fn token(&self) -> &str {
        &self.request.token
    }

    pub fn status(&self) -> RunStatus {
        self.state.lock().status
    }

    pub fn output(&self) -> Option<PathBuf> {
        self.state.lock().output.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().stopwatch.elapsed(self.clock.now())
    }

    /// Hand the request to the transformer.
    ///
    /// A run cancelled before or during dispatch resolves as
    /// [`TaskError::Cancelled`]; a late engine result is discarded.
    pub async fn execute(&self) -> Result<PathBuf, TaskError> {
        if self.state.lock().cancel_requested {
            return Err(TaskError::Cancelled);
        }

        let result = self.transformer.transform(self.request.clone()).await;

        let mut state = self.state.lock();
        if state.cancel_requested {
            return Err(TaskError::Cancelled);
        }
        match result {
            Ok(path) => {
                state.output = Some(path.clone());
                Ok(path)
            }
            Err(e) => Err(TaskError::Failed(e.to_string())),
        }
    }

    /// Abandon this run. `dequeued` says whether it was still waiting in
    /// the queue (and has now been removed from it).
    ///
    /// Dispatched work is not preempted; the engine is asked to terminate
    /// it if it can.
    pub fn cancel(&self, dequeued: bool) {
        let dispatched = {
            let mut state = self.state.lock();
            if state.status.is_terminal() {
                return;
            }
            state.cancel_requested = true;
            if dequeued || state.status != RunStatus::Running {
                state.status = RunStatus::Cancelled;
                state.stopwatch.stop(self.clock.now());
                false
            } else {
                true
            }
        };

        if dispatched {
            self.request_terminate();
        }
    }

    fn request_terminate(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let transformer = self.transformer.clone();
        let token = self.request.token.clone();
        let photo = self.photo.short(SHORT_ID_LEN).to_string();
        let index = self.index;
        handle.spawn(async move {
            match transformer.terminate(&token).await {
                Ok(true) => tracing::info!(%photo, index, "run terminated"),
                Ok(false) => {
                    tracing::debug!(%photo, index, "engine cannot terminate, result will be discarded")
                }
                Err(e) => tracing::warn!(%photo, index, error = %e, "terminate failed"),
            }
        });
    }

    /// Back to a fresh, unqueued attempt.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.status = RunStatus::Pending;
        state.output = None;
        state.error = None;
        state.cancel_requested = false;
        state.stopwatch.reset();
    }

    pub(crate) fn on_queued(&self) {
        self.state.lock().status = RunStatus::Queued;
    }

    pub(crate) fn on_start(&self) {
        let mut state = self.state.lock();
        if state.cancel_requested {
            return;
        }
        state.status = RunStatus::Running;
        state.stopwatch.start(self.clock.now());
    }

    pub(crate) fn on_finish(&self) {
        let mut state = self.state.lock();
        state.status = RunStatus::Finished;
        state.stopwatch.stop(self.clock.now());
    }

    pub(crate) fn on_fail(&self, error: &TaskError) {
        let mut state = self.state.lock();
        state.stopwatch.stop(self.clock.now());
        if *error == TaskError::Cancelled {
            state.status = RunStatus::Cancelled;
        } else {
            state.status = RunStatus::Failed;
            state.error = Some(error.to_string());
        }
    }
}

/// Queue entry wrapping a shared run.
pub(crate) struct RunTask<T: TransformerAdapter, C: Clock> {
    pub(crate) run: Arc<Run<T, C>>,
}

impl<T: TransformerAdapter, C: Clock> RunTask<T, C> {
    pub(crate) fn new(run: Arc<Run<T, C>>) -> Self {
        Self { run }
    }
}

#[async_trait]
impl<T: TransformerAdapter, C: Clock> QueueTask for RunTask<T, C> {
    type Key = String;

    fn key(&self) -> String {
        self.run.token().to_string()
    }

    async fn run(&self) -> Result<(), TaskError> {
        self.run.execute().await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
