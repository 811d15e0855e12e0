// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable duration formatting for photo and run timers.

use std::time::Duration;

/// Format a run or photo duration: `"850ms"`, `"4.2s"`, `"3m05s"`, `"1h02m"`.
///
/// Sub-minute values keep one decimal because runs on a fast device
/// commonly finish within seconds.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis() as u64;
    if ms < 1_000 {
        return format!("{}ms", ms);
    }
    let secs = ms / 1_000;
    if secs < 60 {
        return format!("{}.{}s", secs, (ms % 1_000) / 100);
    }
    if secs < 3_600 {
        return format!("{}m{:02}s", secs / 60, secs % 60);
    }
    format!("{}h{:02}m", secs / 3_600, (secs % 3_600) / 60)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
