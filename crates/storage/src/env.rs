// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for settings storage.

use std::path::PathBuf;

const APP_DIR: &str = "pq";
const SETTINGS_FILE: &str = "settings.json";

/// Resolve config directory: PQ_CONFIG_DIR > <platform config dir>/pq > ./.pq
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PQ_CONFIG_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::config_dir() {
        Some(base) => base.join(APP_DIR),
        None => PathBuf::from(".").join(format!(".{APP_DIR}")),
    }
}

/// Default location of the settings document.
pub fn default_settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE)
}
