// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Settings storage for pq

pub mod env;
mod migration;
mod settings_store;

pub use migration::{
    AddNotificationsAndUploadMode, Migration, MigrationError, MigrationRegistry,
    NestBodyAndAdvanced, PerPartPreferences,
};
pub use settings_store::{SettingsError, SettingsStore};
