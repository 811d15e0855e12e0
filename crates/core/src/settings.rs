// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User settings document (current schema version).
//!
//! Older documents are upgraded by the storage crate's migration chain
//! before being deserialized into these types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Schema version written by this build.
pub const CURRENT_SETTINGS_VERSION: u32 = 4;

/// Root of the persisted settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub version: u32,
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub processing: ProcessingSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_SETTINGS_VERSION,
            app: AppSettings::default(),
            processing: ProcessingSettings::default(),
            notifications: NotificationSettings::default(),
            preferences: Preferences::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub upload_mode: UploadMode,
}

/// What happens to a photo right after it is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UploadMode {
    /// Queue for execution immediately
    #[default]
    #[serde(rename = "add-queue")]
    AddQueue,
    /// Leave pending so the user can review preferences first
    #[serde(rename = "go-preferences")]
    GoPreferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSettings {
    #[serde(default)]
    pub device: Device,
    /// GPU ordinals handed to the engine when `device` is GPU
    #[serde(default = "default_gpus")]
    pub gpus: Vec<u32>,
    /// CPU threads handed to the engine when `device` is CPU
    #[serde(default = "default_cores")]
    pub cores: u32,
    /// Transformer program; `None` means not configured yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<PathBuf>,
}

fn default_gpus() -> Vec<u32> {
    vec![0]
}

fn default_cores() -> u32 {
    1
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            device: Device::default(),
            gpus: default_gpus(),
            cores: default_cores(),
            engine: None,
        }
    }
}

/// Compute backend used by the transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Device {
    #[default]
    #[serde(rename = "GPU")]
    Gpu,
    #[serde(rename = "CPU")]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Gpu => write!(f, "GPU"),
            Device::Cpu => write!(f, "CPU"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Notify after every single run
    #[serde(default = "enabled")]
    pub run: bool,
    /// Notify when a photo has drained all of its runs
    #[serde(default)]
    pub all_runs: bool,
}

fn enabled() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            run: true,
            all_runs: false,
        }
    }
}

/// Per-photo transformation preferences.
///
/// Snapshotted into each photo when it is created; later edits to the
/// settings document only affect photos submitted afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub body: BodyPreferences,
    #[serde(default)]
    pub advanced: AdvancedPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPreferences {
    /// Number of runs per start cycle
    #[serde(default = "default_executions")]
    pub executions: u32,
    /// Per-part tuning, keyed by part name
    #[serde(flatten)]
    pub parts: BTreeMap<String, PartPreferences>,
}

fn default_executions() -> u32 {
    1
}

impl Default for BodyPreferences {
    fn default() -> Self {
        Self {
            executions: default_executions(),
            parts: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartPreferences {
    pub size: f64,
    #[serde(default)]
    pub randomize: bool,
    #[serde(default)]
    pub progressive: bool,
}

impl Default for PartPreferences {
    fn default() -> Self {
        Self {
            size: 1.0,
            randomize: false,
            progressive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedPreferences {
    #[serde(default)]
    pub scale_mode: ScaleMode,
    /// Engine-specific transformation mode, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_mode: Option<String>,
}

/// How the source image is brought to the engine's input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    #[default]
    #[serde(rename = "auto-rescale")]
    AutoRescale,
    #[serde(rename = "resize")]
    Resize,
    /// User-drawn crop region
    #[serde(rename = "cropjs")]
    Cropjs,
    #[serde(rename = "none")]
    None,
}

impl ScaleMode {
    /// Modes that need a crop region before the first run.
    pub fn requires_crop(&self) -> bool {
        matches!(self, ScaleMode::Cropjs)
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
