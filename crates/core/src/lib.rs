// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pq-core: shared types for the pq photo queue

pub mod clock;
pub mod id;
pub mod photo;
pub mod run;
pub mod settings;
pub mod stopwatch;
pub mod time_fmt;

pub use clock::{Clock, SystemClock};
pub use id::{IdGen, ShortId, UuidIdGen, SHORT_ID_LEN};
pub use photo::{CropRegion, ParseStatusError, PhotoEvent, PhotoId, PhotoStatus};
pub use run::RunStatus;
pub use settings::{
    AdvancedPreferences, AppSettings, BodyPreferences, Device, NotificationSettings,
    PartPreferences, Preferences, ProcessingSettings, ScaleMode, Settings, UploadMode,
    CURRENT_SETTINGS_VERSION,
};
pub use stopwatch::Stopwatch;
pub use time_fmt::format_duration;

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
