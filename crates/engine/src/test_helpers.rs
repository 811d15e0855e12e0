// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::debounce::ChangeNotifier;
use crate::photo::{Photo, PhotoContext};
use crate::registry::{EngineDeps, Registry, RegistryConfig};
use crate::FakeReporter;
use pq_adapters::{FakeDownloader, FakeNotifyAdapter, FakeTransformer, PhotoFile};
use pq_core::{FakeClock, PhotoId, Settings};
use pq_storage::SettingsStore;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Fully-typed test photo.
pub(crate) type TestPhoto = Photo<FakeTransformer, FakeNotifyAdapter, FakeClock>;

/// Fully-typed test registry.
pub(crate) type TestRegistry =
    Registry<FakeTransformer, FakeNotifyAdapter, FakeDownloader, FakeClock>;

/// Fakes plus a scratch directory for inputs and outputs.
pub(crate) struct TestContext {
    pub dir: TempDir,
    pub transformer: FakeTransformer,
    pub notifier: FakeNotifyAdapter,
    pub downloader: FakeDownloader,
    pub reporter: FakeReporter,
    pub clock: FakeClock,
    pub changes: ChangeNotifier<FakeClock>,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        Self {
            dir: tempfile::tempdir().unwrap(),
            transformer: FakeTransformer::new(),
            notifier: FakeNotifyAdapter::new(),
            downloader: FakeDownloader::new(),
            reporter: FakeReporter::new(),
            changes: ChangeNotifier::new(clock.clone()),
            clock,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Write an input image; the name picks its MIME type.
    pub fn write_image(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let dir = self.dir.path().join("in");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub fn photo_context(&self) -> PhotoContext<FakeTransformer, FakeNotifyAdapter, FakeClock> {
        PhotoContext {
            transformer: self.transformer.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
            reporter: Arc::new(self.reporter.clone()),
            changes: self.changes.clone(),
            output_dir: self.output_dir(),
        }
    }

    /// A photo over a freshly written `name`, outside any registry.
    pub fn photo(&self, name: &str, settings: &Settings) -> Arc<TestPhoto> {
        let path = self.write_image(name, name.as_bytes());
        let id = PhotoId::new(format!("{name}-0123456789abcdef"));
        Photo::new(id, PhotoFile::new(path), settings, self.photo_context())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::new(self.output_dir())
    }

    pub fn registry(&self, settings: Settings, config: RegistryConfig) -> TestRegistry {
        let store = SettingsStore::in_memory(settings);
        Registry::new(
            store,
            EngineDeps {
                transformer: self.transformer.clone(),
                notifier: self.notifier.clone(),
                downloader: self.downloader.clone(),
                reporter: Arc::new(self.reporter.clone()),
            },
            self.clock.clone(),
            config,
        )
    }
}

/// Default settings with `executions` runs per photo.
pub(crate) fn settings(executions: u32) -> Settings {
    let mut settings = Settings::default();
    settings.preferences.body.executions = executions;
    settings
}
