// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::path::PathBuf;
use std::time::Duration;

fn parse_duration_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Transformer program override (PQ_ENGINE).
pub fn engine_program() -> Option<PathBuf> {
    std::env::var("PQ_ENGINE")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Whole-request download timeout (default: 30 minutes).
pub fn download_timeout() -> Duration {
    parse_duration_secs("PQ_DOWNLOAD_TIMEOUT_SECS").unwrap_or(Duration::from_secs(30 * 60))
}
