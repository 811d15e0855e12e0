// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Upper bound for a crop invocation.
pub const CROP_TIMEOUT: Duration = Duration::from_secs(60);

/// Safety net for a single transform invocation. The run queue applies
/// its own, tighter, device-dependent limit.
pub const TRANSFORM_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Failure to obtain output from a subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubprocessError {
    /// The program could not be started or waited on
    Io(String),
    /// The deadline passed; the child has been killed
    TimedOut(Duration),
}

/// Run a subprocess with a deadline.
///
/// The child is spawned with `kill_on_drop`, so an elapsed deadline or a
/// dropped caller future tears the process down.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, SubprocessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(SubprocessError::Io(format!(
            "{} failed: {}",
            description, io_err
        ))),
        Err(_elapsed) => {
            tracing::warn!(description, timeout_secs = timeout.as_secs(), "subprocess timed out");
            Err(SubprocessError::TimedOut(timeout))
        }
    }
}

/// Last non-empty line of stderr, for error messages.
pub fn stderr_tail(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
