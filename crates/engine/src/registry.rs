// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Photo registry and global scheduler.
//!
//! The registry owns every submitted photo (newest first, bounded) and a
//! single-worker queue that lets exactly one photo drive the engine at a
//! time. Status changes from any photo are coalesced into
//! [`RegistryEvent::Changed`](crate::RegistryEvent).

use crate::debounce::{ChangeNotifier, RegistryEvent};
use crate::error::{EngineError, ValidationError};
use crate::photo::{Photo, PhotoContext};
use crate::queue::{QueueConfig, QueueObserver, QueueTask, TaskError, TaskQueue};
use crate::report::ErrorReporter;
use async_trait::async_trait;
use parking_lot::Mutex;
use pq_adapters::{parse_http_url, Downloader, NotifyAdapter, PhotoFile, TransformerAdapter};
use pq_core::{Clock, IdGen, PhotoId, PhotoStatus, UploadMode, UuidIdGen, SHORT_ID_LEN};
use pq_storage::SettingsStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;

/// Most photos kept; older ones are evicted.
pub const REGISTRY_CAPACITY: usize = 1000;

/// Limit on one photo's whole cycle.
pub const PHOTO_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Pause between photos.
pub const PHOTO_DELAY: Duration = Duration::from_millis(500);

/// Global queue shape: one photo at a time.
pub fn photo_queue_config() -> QueueConfig {
    QueueConfig {
        name: "photos",
        concurrency: 1,
        timeout: PHOTO_TIMEOUT,
        delay: PHOTO_DELAY,
    }
}

/// Registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub capacity: usize,
    /// Run outputs, crops and downloads are written here
    pub output_dir: PathBuf,
    pub queue: QueueConfig,
}

impl RegistryConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            capacity: REGISTRY_CAPACITY,
            output_dir: output_dir.into(),
            queue: photo_queue_config(),
        }
    }
}

/// Registry adapter dependencies
pub struct EngineDeps<T, N, D> {
    pub transformer: T,
    pub notifier: N,
    pub downloader: D,
    pub reporter: Arc<dyn ErrorReporter>,
}

struct RegistryInner<T: TransformerAdapter, N: NotifyAdapter, C: Clock> {
    photos: Mutex<Vec<Arc<Photo<T, N, C>>>>,
    settings: SettingsStore,
    ctx: PhotoContext<T, N, C>,
    capacity: usize,
}

/// What a global queue entry does when it reaches the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    /// Derive fresh runs from the preferences
    Full,
    /// Repeat one existing run
    Rerun(usize),
}

/// Global queue entry.
struct PhotoTask<T: TransformerAdapter, N: NotifyAdapter, C: Clock> {
    photo: Arc<Photo<T, N, C>>,
    cycle: Cycle,
    reporter: Arc<dyn ErrorReporter>,
}

#[async_trait]
impl<T, N, C> QueueTask for PhotoTask<T, N, C>
where
    T: TransformerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    type Key = PhotoId;

    fn key(&self) -> PhotoId {
        self.photo.id().clone()
    }

    async fn run(&self) -> Result<(), TaskError> {
        let result = match self.cycle {
            Cycle::Full => self.photo.start().await,
            Cycle::Rerun(index) => self.photo.rerun(index).await,
        };
        match result {
            Ok(()) => {
                // Nothing ran (zero executions)
                if self.photo.status() == PhotoStatus::Waiting {
                    self.photo.set_status(PhotoStatus::Pending);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(photo = %self.photo.short_id(), error = %e, "photo could not start");
                self.photo.set_status(PhotoStatus::Pending);
                let context = format!("photo {}", self.photo.short_id());
                self.reporter.report(&context, &e);
                Err(TaskError::Failed(e.to_string()))
            }
        }
    }
}

impl<T, N, C> QueueObserver<PhotoTask<T, N, C>> for RegistryInner<T, N, C>
where
    T: TransformerAdapter,
    N: NotifyAdapter,
    C: Clock,
{
    fn on_enqueued(&self, task: &PhotoTask<T, N, C>) {
        task.photo.set_status(PhotoStatus::Waiting);
    }

    fn on_started(&self, task: &PhotoTask<T, N, C>) {
        tracing::debug!(photo = %task.photo.short_id(), "photo dequeued");
    }

    fn on_failed(&self, task: &PhotoTask<T, N, C>, error: &TaskError) {
        if let TaskError::Timeout(after) = error {
            tracing::warn!(photo = %task.photo.short_id(), ?after, "photo timed out");
            task.photo.cancel(PhotoStatus::Finished);
        }
    }

    fn on_drained(&self) {
        tracing::debug!("photo queue drained");
        self.ctx.changes.request();
    }
}

/// Owner of all photos and the global photo queue.
pub struct Registry<T, N, D, C>
where
    T: TransformerAdapter,
    N: NotifyAdapter,
    D: Downloader,
    C: Clock,
{
    inner: Arc<RegistryInner<T, N, C>>,
    queue: TaskQueue<PhotoTask<T, N, C>>,
    downloader: D,
}

impl<T, N, D, C> Registry<T, N, D, C>
where
    T: TransformerAdapter,
    N: NotifyAdapter,
    D: Downloader,
    C: Clock,
{
    /// Create a registry. Must be called inside a tokio runtime.
    pub fn new(
        settings: SettingsStore,
        deps: EngineDeps<T, N, D>,
        clock: C,
        config: RegistryConfig,
    ) -> Self {
        let inner = Arc::new(RegistryInner {
            photos: Mutex::new(Vec::new()),
            settings,
            ctx: PhotoContext {
                transformer: deps.transformer,
                notifier: deps.notifier,
                changes: ChangeNotifier::new(clock.clone()),
                clock,
                reporter: deps.reporter,
                output_dir: config.output_dir,
            },
            capacity: config.capacity.max(1),
        });
        let weak = Arc::downgrade(&inner);
        let observer: Weak<dyn QueueObserver<PhotoTask<T, N, C>>> = weak;
        let queue = TaskQueue::new(config.queue, observer);

        Self {
            inner,
            queue,
            downloader: deps.downloader,
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    /// Submit one image file.
    ///
    /// Returns `None` when a photo with the same content is already
    /// registered.
    pub async fn add(&self, file: PhotoFile) -> Result<Option<Arc<Photo<T, N, C>>>, EngineError> {
        if !file.exists() {
            return Err(ValidationError::NotFound(file.path().to_path_buf()).into());
        }
        if !file.is_supported() {
            return Err(ValidationError::UnsupportedType {
                path: file.path().to_path_buf(),
                mime: file.mime().unwrap_or("unknown").to_string(),
            }
            .into());
        }

        let id = PhotoId::new(file.hash().await?);
        let settings = self.inner.settings.snapshot();

        let (photo, evicted) = {
            let mut photos = self.inner.photos.lock();
            if photos.iter().any(|p| p.id() == &id) {
                tracing::debug!(photo = %id.short(SHORT_ID_LEN), path = %file.path().display(), "already registered");
                return Ok(None);
            }
            let photo = Photo::new(id, file, &settings, self.inner.ctx.clone());
            photos.insert(0, Arc::clone(&photo));
            let evicted = if photos.len() > self.inner.capacity {
                photos.split_off(self.inner.capacity)
            } else {
                Vec::new()
            };
            (photo, evicted)
        };

        for old in evicted {
            tracing::info!(photo = %old.short_id(), "evicting oldest photo");
            self.queue.remove(old.id());
            old.cancel(PhotoStatus::Finished);
        }

        tracing::info!(photo = %photo.short_id(), name = %photo.name(), "photo added");
        self.inner.ctx.changes.request();

        match settings.app.upload_mode {
            UploadMode::AddQueue => {
                self.add_to_queue(&photo);
            }
            UploadMode::GoPreferences => {}
        }
        Ok(Some(photo))
    }

    /// Submit a file, or every supported file directly inside a directory.
    pub async fn add_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<Arc<Photo<T, N, C>>>, EngineError> {
        let path = path.as_ref();
        let file = PhotoFile::new(path);
        if !file.exists() {
            return Err(ValidationError::NotFound(path.to_path_buf()).into());
        }
        if !file.is_dir() {
            return Ok(self.add(file).await?.into_iter().collect());
        }

        let read_dir_error = |source| EngineError::ReadDir {
            path: path.to_path_buf(),
            source,
        };
        let mut entries = tokio::fs::read_dir(path).await.map_err(read_dir_error)?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
            children.push(entry.path());
        }
        children.sort();

        let mut added = Vec::new();
        for child in children {
            let child = PhotoFile::new(child);
            if child.is_dir() {
                tracing::debug!(path = %child.path().display(), "skipping nested directory");
                continue;
            }
            if !child.is_supported() {
                tracing::warn!(path = %child.path().display(), "skipping unsupported file");
                continue;
            }
            if let Some(photo) = self.add(child).await? {
                added.push(photo);
            }
        }
        Ok(added)
    }

    /// Submit several paths, stopping at the first error.
    pub async fn add_files<I, P>(&self, paths: I) -> Result<Vec<Arc<Photo<T, N, C>>>, EngineError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut added = Vec::new();
        for path in paths {
            added.extend(self.add_file(path).await?);
        }
        Ok(added)
    }

    /// Download an http(s) image and submit it.
    pub async fn add_url(&self, raw: &str) -> Result<Option<Arc<Photo<T, N, C>>>, EngineError> {
        let url = parse_http_url(raw).map_err(ValidationError::from)?;
        let dest = self
            .inner
            .ctx
            .output_dir
            .join("downloads")
            .join(UuidIdGen.next());
        let path = self.downloader.download(&url, &dest).await?;
        self.add(PhotoFile::new(path)).await
    }

    /// Queue a photo. Finished photos are reset first; a photo that is
    /// already waiting or running is left alone (returns false).
    pub fn add_to_queue(&self, photo: &Arc<Photo<T, N, C>>) -> bool {
        match photo.status() {
            PhotoStatus::Waiting | PhotoStatus::Running => return false,
            PhotoStatus::Finished => photo.reset(),
            PhotoStatus::Pending => {}
        }
        self.queue.push(PhotoTask {
            photo: Arc::clone(photo),
            cycle: Cycle::Full,
            reporter: Arc::clone(&self.inner.ctx.reporter),
        })
    }

    /// Queue one run of a photo to be attempted again.
    ///
    /// The rerun waits its turn on the photo queue like any other cycle.
    /// Returns false when the photo is already waiting or running.
    pub fn rerun(&self, photo: &Arc<Photo<T, N, C>>, index: usize) -> Result<bool, EngineError> {
        if matches!(photo.status(), PhotoStatus::Waiting | PhotoStatus::Running) {
            return Ok(false);
        }
        photo.rerunnable(index)?;
        Ok(self.queue.push(PhotoTask {
            photo: Arc::clone(photo),
            cycle: Cycle::Rerun(index),
            reporter: Arc::clone(&self.inner.ctx.reporter),
        }))
    }

    /// Take a waiting photo out of the queue (or stop a running one) and
    /// return it to pending. Other photos are left alone (returns false).
    pub fn remove_from_queue(&self, photo: &Arc<Photo<T, N, C>>) -> bool {
        if !matches!(photo.status(), PhotoStatus::Waiting | PhotoStatus::Running) {
            return false;
        }
        self.queue.remove(photo.id());
        photo.cancel(PhotoStatus::Pending);
        true
    }

    /// Stop a photo and forget it.
    pub fn remove(&self, photo: &Arc<Photo<T, N, C>>) {
        self.queue.remove(photo.id());
        photo.cancel(PhotoStatus::Finished);
        self.inner.photos.lock().retain(|p| p.id() != photo.id());
        tracing::info!(photo = %photo.short_id(), "photo removed");
        self.inner.ctx.changes.request();
    }

    /// Queue every photo currently in `status`. Returns how many were queued.
    pub fn run_all(&self, status: PhotoStatus) -> usize {
        // Oldest first, so they run in submission order.
        let matching: Vec<_> = self
            .photos()
            .into_iter()
            .rev()
            .filter(|p| p.status() == status)
            .collect();
        matching.iter().filter(|p| self.add_to_queue(p)).count()
    }

    /// All photos, newest first.
    pub fn photos(&self) -> Vec<Arc<Photo<T, N, C>>> {
        self.inner.photos.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Photo<T, N, C>>> {
        self.inner
            .photos
            .lock()
            .iter()
            .find(|p| p.id().as_str() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.photos.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coalesced change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.inner.ctx.changes.subscribe()
    }

    /// Resolve once no photo is waiting or running.
    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await;
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
