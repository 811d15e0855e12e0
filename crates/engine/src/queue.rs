// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory task queue with bounded concurrency.
//!
//! A queue owns a fixed set of tokio worker tasks. Each worker pops the
//! oldest pending task, runs it under the configured timeout, reports the
//! outcome to the observer, then waits `delay` before taking more work.
//! Hooks are synchronous and are never called with the queue lock held.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Notify};

/// Worker pool shape for one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Label used in logs
    pub name: &'static str,
    pub concurrency: usize,
    /// Per-task limit; the task future is dropped when it elapses
    pub timeout: Duration,
    /// Pause after each task before the worker takes the next one
    pub delay: Duration,
}

/// Why a task did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Abandoned on request. Not reported as a failure.
    #[error("cancelled")]
    Cancelled,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Failed(String),
}

/// Unit of work accepted by a [`TaskQueue`].
#[async_trait]
pub trait QueueTask: Send + Sync + 'static {
    type Key: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Identity used for removal and duplicate suppression
    fn key(&self) -> Self::Key;

    async fn run(&self) -> Result<(), TaskError>;
}

/// Lifecycle hooks for queued tasks.
pub trait QueueObserver<T>: Send + Sync + 'static {
    fn on_enqueued(&self, _task: &T) {}
    fn on_started(&self, _task: &T) {}
    fn on_finished(&self, _task: &T) {}
    fn on_failed(&self, _task: &T, _error: &TaskError) {}
    /// Nothing pending and nothing running
    fn on_drained(&self) {}
}

struct QueueState<T: QueueTask> {
    pending: VecDeque<T>,
    active: Vec<T::Key>,
    closed: bool,
}

impl<T: QueueTask> QueueState<T> {
    fn holds(&self, key: &T::Key) -> bool {
        self.active.contains(key) || self.pending.iter().any(|t| &t.key() == key)
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }

    fn load(&self) -> usize {
        self.pending.len() + self.active.len()
    }
}

struct Shared<T: QueueTask> {
    config: QueueConfig,
    state: Mutex<QueueState<T>>,
    wake: Notify,
    load: watch::Sender<usize>,
    observer: Weak<dyn QueueObserver<T>>,
}

impl<T: QueueTask> Shared<T> {
    fn observer(&self) -> Option<Arc<dyn QueueObserver<T>>> {
        self.observer.upgrade()
    }

    fn publish_load(&self, state: &QueueState<T>) {
        self.load.send_replace(state.load());
    }
}

/// Handle to a running queue. Dropping it stops the workers once their
/// current task (if any) completes; pending tasks are discarded.
pub struct TaskQueue<T: QueueTask> {
    shared: Arc<Shared<T>>,
}

impl<T: QueueTask> TaskQueue<T> {
    /// Start the workers. Must be called inside a tokio runtime.
    pub fn new(config: QueueConfig, observer: Weak<dyn QueueObserver<T>>) -> Self {
        let (load, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            config,
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                active: Vec::new(),
                closed: false,
            }),
            wake: Notify::new(),
            load,
            observer,
        });

        for worker in 0..shared.config.concurrency.max(1) {
            tokio::spawn(worker_loop(Arc::clone(&shared), worker));
        }

        Self { shared }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Append a task. Returns false if a task with the same key is already
    /// pending or running.
    pub fn push(&self, task: T) -> bool {
        let key = task.key();
        if self.shared.state.lock().holds(&key) {
            return false;
        }

        // Before the task becomes visible, so the enqueued hook can't race
        // the started hook.
        if let Some(observer) = self.shared.observer() {
            observer.on_enqueued(&task);
        }

        {
            let mut state = self.shared.state.lock();
            if state.closed || state.holds(&key) {
                return false;
            }
            state.pending.push_back(task);
            self.shared.publish_load(&state);
        }
        tracing::debug!(queue = self.shared.config.name, ?key, "task enqueued");
        self.shared.wake.notify_one();
        true
    }

    /// Remove a pending task. Running tasks are not affected.
    pub fn remove(&self, key: &T::Key) -> Option<T> {
        let (removed, drained) = {
            let mut state = self.shared.state.lock();
            let position = state.pending.iter().position(|t| &t.key() == key)?;
            let removed = state.pending.remove(position);
            self.shared.publish_load(&state);
            (removed, state.is_idle())
        };
        tracing::debug!(queue = self.shared.config.name, ?key, "task removed");

        if drained {
            if let Some(observer) = self.shared.observer() {
                observer.on_drained();
            }
        }
        removed
    }

    /// Whether a task with `key` is pending or running.
    pub fn contains(&self, key: &T::Key) -> bool {
        self.shared.state.lock().holds(key)
    }

    /// Number of tasks waiting for a worker.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Number of tasks currently running.
    pub fn active(&self) -> usize {
        self.shared.state.lock().active.len()
    }

    /// Resolve once nothing is pending or running.
    pub async fn wait_idle(&self) {
        let mut load = self.shared.load.subscribe();
        // The sender lives in `shared`, which we hold.
        let _ = load.wait_for(|n| *n == 0).await;
    }
}

impl<T: QueueTask> Drop for TaskQueue<T> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.pending.clear();
            self.shared.publish_load(&state);
        }
        self.shared.wake.notify_waiters();
    }
}

async fn worker_loop<T: QueueTask>(shared: Arc<Shared<T>>, worker: usize) {
    let name = shared.config.name;
    loop {
        let task = loop {
            // Registered before the state check so a push in between is not lost.
            let wake = shared.wake.notified();
            {
                let mut state = shared.state.lock();
                if state.closed {
                    tracing::trace!(queue = name, worker, "worker stopped");
                    return;
                }
                if let Some(task) = state.pending.pop_front() {
                    state.active.push(task.key());
                    shared.publish_load(&state);
                    break task;
                }
            }
            wake.await;
        };

        let key = task.key();
        if let Some(observer) = shared.observer() {
            observer.on_started(&task);
        }
        tracing::debug!(queue = name, ?key, "task started");

        let timeout = shared.config.timeout;
        let result = match tokio::time::timeout(timeout, task.run()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(TaskError::Timeout(timeout)),
        };

        match &result {
            Ok(()) => {
                tracing::debug!(queue = name, ?key, "task finished");
                if let Some(observer) = shared.observer() {
                    observer.on_finished(&task);
                }
            }
            Err(error) => {
                tracing::debug!(queue = name, ?key, %error, "task failed");
                if let Some(observer) = shared.observer() {
                    observer.on_failed(&task, error);
                }
            }
        }
        drop(task);

        let drained = {
            let mut state = shared.state.lock();
            if let Some(position) = state.active.iter().position(|k| k == &key) {
                state.active.remove(position);
            }
            shared.publish_load(&state);
            state.is_idle() && !state.closed
        };
        if drained {
            tracing::debug!(queue = name, "queue drained");
            if let Some(observer) = shared.observer() {
                observer.on_drained();
            }
        }

        if !shared.config.delay.is_zero() {
            tokio::time::sleep(shared.config.delay).await;
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
