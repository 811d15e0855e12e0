// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Photo identifier, lifecycle status and observer events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id! {
    /// Identity of a submitted photo: hex SHA-256 of the source bytes.
    ///
    /// Byte-identical resubmissions map to the same id, which is what makes
    /// registry insertion idempotent.
    pub struct PhotoId;
}

/// Lifecycle of a photo inside the registry.
///
/// ```text
/// pending ──enqueue──▶ waiting ──dequeue──▶ running ──drain──▶ finished
///    ▲                    │                    │                  │
///    └──── queue removal ─┴────────────────────┘      reset ──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhotoStatus {
    /// Submitted, not queued
    #[default]
    Pending,
    /// In the global queue, not yet dequeued
    Waiting,
    /// Runs are being drained through the photo's local queue
    Running,
    /// Local queue drained, or abandoned
    Finished,
}

impl PhotoStatus {
    /// Waiting or running: the photo holds (or is about to hold) the engine.
    pub fn is_active(&self) -> bool {
        matches!(self, PhotoStatus::Waiting | PhotoStatus::Running)
    }
}

impl fmt::Display for PhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoStatus::Pending => write!(f, "pending"),
            PhotoStatus::Waiting => write!(f, "waiting"),
            PhotoStatus::Running => write!(f, "running"),
            PhotoStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Error parsing a [`PhotoStatus`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown photo status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for PhotoStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PhotoStatus::Pending),
            "waiting" => Ok(PhotoStatus::Waiting),
            "running" => Ok(PhotoStatus::Running),
            "finished" => Ok(PhotoStatus::Finished),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Manually selected crop rectangle, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A region with no area can't be cropped to.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Per-photo events for interested observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PhotoEvent {
    /// A start cycle (or a rerun) moved the photo to running
    #[serde(rename = "photo:started")]
    Started { id: PhotoId },

    /// The local queue drained
    #[serde(rename = "photo:finished")]
    Finished { id: PhotoId },
}

#[cfg(test)]
#[path = "photo_tests.rs"]
mod tests;
