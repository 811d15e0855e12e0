// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run (work unit) status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one execution attempt, mirroring its queue lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, not pushed onto a queue yet
    #[default]
    Pending,
    /// Pushed onto the photo's local queue
    Queued,
    /// Dispatched to the transformer
    Running,
    /// Transformer produced an output
    Finished,
    /// Transformer error or timeout
    Failed,
    /// Abandoned by a photo cancel, queued or dispatched
    Cancelled,
}

impl RunStatus {
    /// No further lifecycle hooks will fire for this attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Finished | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Queued => write!(f, "queued"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Finished => write!(f, "finished"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
