// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Settings persistence.
//!
//! The document lives at a fixed per-user path. Loading upgrades old
//! documents through the migration chain and writes the result back;
//! a missing file is populated with defaults on first run.

use crate::migration::{MigrationError, MigrationRegistry};
use parking_lot::RwLock;
use pq_core::{Preferences, Settings, CURRENT_SETTINGS_VERSION};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Shared, read-mostly handle to the current settings.
///
/// Clones share the same document. Readers take a [`snapshot`](Self::snapshot);
/// nothing in the engine holds the lock across an await.
#[derive(Clone)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: Arc<RwLock<Settings>>,
}

impl SettingsStore {
    /// Load settings from `path`, creating or upgrading the file as needed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let settings = match read_document(&path)? {
            Some(document) => {
                let from = MigrationRegistry::version_of(&document);
                let document =
                    MigrationRegistry::new().migrate_to(document, CURRENT_SETTINGS_VERSION)?;
                let settings: Settings = serde_json::from_value(document)?;
                if from != u64::from(CURRENT_SETTINGS_VERSION) {
                    info!(from, to = CURRENT_SETTINGS_VERSION, path = %path.display(), "upgraded settings");
                    save_document(&path, &settings)?;
                }
                settings
            }
            None => {
                info!(path = %path.display(), "no settings found, writing defaults");
                let settings = Settings::default();
                save_document(&path, &settings)?;
                settings
            }
        };

        Ok(Self {
            path: Some(path),
            current: Arc::new(RwLock::new(settings)),
        })
    }

    /// Settings that are never written to disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            current: Arc::new(RwLock::new(settings)),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> Settings {
        self.current.read().clone()
    }

    /// Copy of the current per-photo preferences.
    pub fn preferences(&self) -> Preferences {
        self.current.read().preferences.clone()
    }

    /// Apply `f` to the document and persist the result.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<(), SettingsError> {
        let settings = {
            let mut current = self.current.write();
            f(&mut current);
            current.clone()
        };
        if let Some(path) = &self.path {
            save_document(path, &settings)?;
        }
        Ok(())
    }
}

/// Read the raw document. Corrupt files are moved aside and treated as missing.
fn read_document(path: &Path) -> Result<Option<Value>, SettingsError> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(document) => Ok(Some(document)),
        Err(e) => {
            let bak_path = path.with_extension("bak");
            warn!(
                error = %e,
                path = %path.display(),
                bak = %bak_path.display(),
                "corrupt settings, moving to .bak and starting fresh",
            );
            fs::rename(path, &bak_path)?;
            Ok(None)
        }
    }
}

/// Save atomically (write to .tmp, then rename).
fn save_document(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, settings)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "settings_store_tests.rs"]
mod tests;
