// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Photo controller: one submitted image, its runs, and its run queue.

use crate::debounce::ChangeNotifier;
use crate::error::{EngineError, ValidationError};
use crate::queue::{QueueConfig, QueueObserver, TaskError, TaskQueue};
use crate::report::ErrorReporter;
use crate::run::{Run, RunTask};
use parking_lot::Mutex;
use pq_adapters::{NotifyAdapter, PhotoFile, TransformRequest, TransformerAdapter};
use pq_core::{
    format_duration, Clock, CropRegion, Device, IdGen, NotificationSettings, PhotoEvent,
    PhotoId, PhotoStatus, Preferences, RunStatus, Settings, Stopwatch, UuidIdGen,
    SHORT_ID_LEN,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Per-run limit on the accelerated device.
pub const GPU_RUN_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Per-run limit on the CPU fallback.
pub const CPU_RUN_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const EVENT_CAPACITY: usize = 16;

/// Run queue shape: strictly sequential, no pause between runs.
pub fn run_queue_config(device: Device) -> QueueConfig {
    QueueConfig {
        name: "runs",
        concurrency: 1,
        timeout: match device {
            Device::Gpu => GPU_RUN_TIMEOUT,
            Device::Cpu => CPU_RUN_TIMEOUT,
        },
        delay: Duration::ZERO,
    }
}

/// Collaborators shared by every photo in a registry.
#[derive(Clone)]
pub(crate) struct PhotoContext<T: TransformerAdapter, N: NotifyAdapter, C: Clock> {
    pub(crate) transformer: T,
    pub(crate) notifier: N,
    pub(crate) clock: C,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    pub(crate) changes: ChangeNotifier<C>,
    pub(crate) output_dir: PathBuf,
}

struct PhotoState<T: TransformerAdapter, C: Clock> {
    status: PhotoStatus,
    runs: Vec<Arc<Run<T, C>>>,
    crop_region: Option<CropRegion>,
    cropped_file: Option<PathBuf>,
    stopwatch: Stopwatch,
    /// Set by `cancel` until the next start cycle; a later drain must not
    /// override the cancel target.
    cancelled: bool,
}

/// A submitted image and its state machine.
///
/// ```text
/// pending → waiting → running → finished
/// ```
///
/// Queue removal sends a waiting or running photo back to pending;
/// `reset` sends a finished one back to pending.
pub struct Photo<T: TransformerAdapter, N: NotifyAdapter, C: Clock> {
    id: PhotoId,
    file: PhotoFile,
    preferences: Preferences,
    device: Device,
    notifications: NotificationSettings,
    ctx: PhotoContext<T, N, C>,
    runs_queue: TaskQueue<RunTask<T, C>>,
    state: Mutex<PhotoState<T, C>>,
    events: broadcast::Sender<PhotoEvent>,
    /// Bumped whenever the current cycle ends (drain or cancel)
    finish: watch::Sender<u64>,
}

impl<T, N, C> Photo<T, N, C>
where
    T: TransformerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    /// Create a photo, snapshotting the preferences in `settings`.
    pub(crate) fn new(
        id: PhotoId,
        file: PhotoFile,
        settings: &Settings,
        ctx: PhotoContext<T, N, C>,
    ) -> Arc<Self> {
        let device = settings.processing.device;
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let observer: Weak<dyn QueueObserver<RunTask<T, C>>> = weak.clone();
            let (events, _) = broadcast::channel(EVENT_CAPACITY);
            let (finish, _) = watch::channel(0);
            Self {
                id,
                file,
                preferences: settings.preferences.clone(),
                device,
                notifications: settings.notifications,
                ctx,
                runs_queue: TaskQueue::new(run_queue_config(device), observer),
                state: Mutex::new(PhotoState {
                    status: PhotoStatus::Pending,
                    runs: Vec::new(),
                    crop_region: None,
                    cropped_file: None,
                    stopwatch: Stopwatch::new(),
                    cancelled: false,
                }),
                events,
                finish,
            }
        })
    }

    pub fn id(&self) -> &PhotoId {
        &self.id
    }

    pub fn file(&self) -> &PhotoFile {
        &self.file
    }

    pub fn name(&self) -> String {
        self.file.name()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn status(&self) -> PhotoStatus {
        self.state.lock().status
    }

    pub fn runs(&self) -> Vec<Arc<Run<T, C>>> {
        self.state.lock().runs.clone()
    }

    pub fn crop_region(&self) -> Option<CropRegion> {
        self.state.lock().crop_region
    }

    pub fn cropped_file(&self) -> Option<PathBuf> {
        self.state.lock().cropped_file.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().stopwatch.elapsed(self.ctx.clock.now())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PhotoEvent> {
        self.events.subscribe()
    }

    /// Record the manual crop rectangle used by the `cropjs` scale mode.
    pub fn set_crop_region(&self, region: CropRegion) -> Result<(), ValidationError> {
        if region.is_empty() {
            return Err(ValidationError::EmptyCropRegion(region));
        }
        self.state.lock().crop_region = Some(region);
        self.ctx.changes.request();
        Ok(())
    }

    /// Execute one cycle: derive runs from the preferences, drain them
    /// through the run queue, and resolve when the queue drains or the
    /// photo is cancelled.
    pub async fn start(&self) -> Result<(), EngineError> {
        let executions = self.preferences.body.executions as usize;
        if executions == 0 {
            tracing::debug!(photo = %self.short_id(), "no executions requested");
            return Ok(());
        }

        self.state.lock().cancelled = false;
        let input = if self.preferences.advanced.scale_mode.requires_crop() {
            self.crop().await?
        } else {
            self.file.path().to_path_buf()
        };

        let mut finished = self.finish.subscribe();
        let runs = {
            let mut state = self.state.lock();
            if state.cancelled {
                return Ok(());
            }
            let now = self.ctx.clock.now();
            state.status = PhotoStatus::Running;
            state.stopwatch.reset();
            state.stopwatch.start(now);
            state.runs = (1..=executions).map(|i| self.new_run(i, &input)).collect();
            state.runs.clone()
        };

        tracing::info!(photo = %self.short_id(), executions, device = %self.device, "photo started");
        self.ctx.changes.request();
        let _ = self.events.send(PhotoEvent::Started {
            id: self.id.clone(),
        });

        for run in runs {
            self.runs_queue.push(RunTask::new(run));
        }

        // The sender lives in self.
        let _ = finished.changed().await;
        Ok(())
    }

    /// Abandon the current cycle and force `target`.
    ///
    /// Queued runs are dequeued; a dispatched run keeps going on the
    /// engine unless it supports `terminate`, and its result is dropped.
    pub fn cancel(&self, target: PhotoStatus) {
        let runs = {
            let mut state = self.state.lock();
            state.cancelled = true;
            state.status = target;
            state.stopwatch.stop(self.ctx.clock.now());
            state.runs.clone()
        };

        for run in &runs {
            let dequeued = self.runs_queue.remove(&run.token().to_string()).is_some();
            run.cancel(dequeued);
        }

        tracing::info!(photo = %self.short_id(), %target, "photo cancelled");
        self.ctx.changes.request();
        self.finish.send_modify(|n| *n += 1);
    }

    /// The run at `index`, if it can be attempted again.
    pub(crate) fn rerunnable(&self, index: usize) -> Result<Arc<Run<T, C>>, EngineError> {
        let run = self
            .state
            .lock()
            .runs
            .iter()
            .find(|r| r.index() == index)
            .cloned()
            .ok_or(EngineError::RunNotFound(index))?;
        if matches!(run.status(), RunStatus::Queued | RunStatus::Running) {
            return Err(EngineError::RunActive(index));
        }
        Ok(run)
    }

    /// Run a single attempt again and resolve when the photo drains.
    ///
    /// Only the registry's photo queue calls this, so engine dispatch
    /// stays one at a time across photos.
    pub(crate) async fn rerun(&self, index: usize) -> Result<(), EngineError> {
        let run = self.rerunnable(index)?;

        let mut finished = self.finish.subscribe();
        run.reset();
        {
            let mut state = self.state.lock();
            state.cancelled = false;
            state.status = PhotoStatus::Running;
            state.stopwatch.start(self.ctx.clock.now());
        }

        tracing::info!(photo = %self.short_id(), index, "rerunning");
        self.ctx.changes.request();
        let _ = self.events.send(PhotoEvent::Started {
            id: self.id.clone(),
        });
        self.runs_queue.push(RunTask::new(run));

        // The sender lives in self.
        let _ = finished.changed().await;
        Ok(())
    }

    /// Back to pending with no runs and a zeroed timer.
    pub fn reset(&self) {
        let runs = {
            let mut state = self.state.lock();
            state.status = PhotoStatus::Pending;
            state.stopwatch.reset();
            state.cancelled = false;
            std::mem::take(&mut state.runs)
        };
        for run in &runs {
            let dequeued = self.runs_queue.remove(&run.token().to_string()).is_some();
            run.cancel(dequeued);
        }
        self.ctx.changes.request();
    }

    pub(crate) fn set_status(&self, status: PhotoStatus) {
        self.state.lock().status = status;
        self.ctx.changes.request();
    }

    pub(crate) fn short_id(&self) -> &str {
        self.id.short(SHORT_ID_LEN)
    }

    /// (finished runs, all runs) of the current cycle
    pub fn run_counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        let ok = state
            .runs
            .iter()
            .filter(|r| r.status() == RunStatus::Finished)
            .count();
        (ok, state.runs.len())
    }

    async fn crop(&self) -> Result<PathBuf, EngineError> {
        let region = self
            .state
            .lock()
            .crop_region
            .ok_or(ValidationError::MissingCropRegion)?;
        let dest = self.output_path("crop");

        self.ctx
            .transformer
            .crop(self.file.path(), region, &dest)
            .await?;

        self.state.lock().cropped_file = Some(dest.clone());
        Ok(dest)
    }

    fn new_run(&self, index: usize, input: &Path) -> Arc<Run<T, C>> {
        let request = TransformRequest {
            token: UuidIdGen.next(),
            input: input.to_path_buf(),
            output: self.output_path(index),
            device: self.device,
            preferences: self.preferences.clone(),
        };
        Arc::new(Run::new(
            index,
            self.id.clone(),
            request,
            self.ctx.transformer.clone(),
            self.ctx.clock.clone(),
        ))
    }

    fn output_path(&self, suffix: impl std::fmt::Display) -> PathBuf {
        let ext = self.file.extension().unwrap_or_else(|| "png".to_string());
        self.ctx
            .output_dir
            .join(format!("{}-{suffix}.{ext}", self.short_id()))
    }

    fn notify(&self, title: &'static str, message: String) {
        if self.ctx.notifier.app_focused() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let notifier = self.ctx.notifier.clone();
        handle.spawn(async move {
            if let Err(e) = notifier.notify(title, &message).await {
                tracing::debug!(error = %e, "notification failed");
            }
        });
    }
}

impl<T, N, C> std::fmt::Debug for Photo<T, N, C>
where
    T: TransformerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl<T, N, C> QueueObserver<RunTask<T, C>> for Photo<T, N, C>
where
    T: TransformerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    fn on_enqueued(&self, task: &RunTask<T, C>) {
        task.run.on_queued();
    }

    fn on_started(&self, task: &RunTask<T, C>) {
        task.run.on_start();
        tracing::debug!(photo = %self.short_id(), index = task.run.index(), "run started");
        self.ctx.changes.request();
    }

    fn on_finished(&self, task: &RunTask<T, C>) {
        task.run.on_finish();
        tracing::info!(
            photo = %self.short_id(),
            index = task.run.index(),
            elapsed = %format_duration(task.run.elapsed()),
            "run finished",
        );
        self.ctx.changes.request();
        if self.notifications.run {
            self.notify(
                "Run finished",
                format!("{} #{}", self.name(), task.run.index()),
            );
        }
    }

    fn on_failed(&self, task: &RunTask<T, C>, error: &TaskError) {
        task.run.on_fail(error);
        self.ctx.changes.request();
        if *error == TaskError::Cancelled {
            tracing::debug!(photo = %self.short_id(), index = task.run.index(), "run cancelled");
            return;
        }
        tracing::warn!(photo = %self.short_id(), index = task.run.index(), %error, "run failed");
        let context = format!("photo {} run {}", self.short_id(), task.run.index());
        self.ctx.reporter.report(&context, error);
    }

    fn on_drained(&self) {
        let (ok, total, elapsed) = {
            let mut state = self.state.lock();
            if state.cancelled || state.status != PhotoStatus::Running {
                return;
            }
            // Runs are pushed one at a time; a fast worker can empty the
            // queue before the last push.
            if !state.runs.iter().all(|r| r.status().is_terminal()) {
                return;
            }
            let now = self.ctx.clock.now();
            state.status = PhotoStatus::Finished;
            state.stopwatch.stop(now);
            let ok = state
                .runs
                .iter()
                .filter(|r| r.status() == RunStatus::Finished)
                .count();
            (ok, state.runs.len(), state.stopwatch.elapsed(now))
        };

        tracing::info!(
            photo = %self.short_id(),
            ok,
            total,
            elapsed = %format_duration(elapsed),
            "photo finished",
        );
        self.ctx.changes.request();
        let _ = self.events.send(PhotoEvent::Finished {
            id: self.id.clone(),
        });
        self.finish.send_modify(|n| *n += 1);

        if self.notifications.all_runs {
            self.notify(
                "Photo finished",
                format!(
                    "{}: {ok}/{total} runs in {}",
                    self.name(),
                    format_duration(elapsed)
                ),
            );
        }
    }
}

#[cfg(test)]
#[path = "photo_tests.rs"]
mod tests;
