// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pq execution engine: task queues, photos, runs and the registry

pub mod debounce;
mod error;
mod photo;
pub mod queue;
mod registry;
mod report;
mod run;

#[cfg(test)]
mod test_helpers;

pub use debounce::{ChangeNotifier, Debouncer, RegistryEvent, CHANGE_WINDOW};
pub use error::{EngineError, ValidationError};
pub use photo::{run_queue_config, Photo, CPU_RUN_TIMEOUT, GPU_RUN_TIMEOUT};
pub use queue::{QueueConfig, QueueObserver, QueueTask, TaskError, TaskQueue};
pub use registry::{
    photo_queue_config, EngineDeps, Registry, RegistryConfig, PHOTO_DELAY, PHOTO_TIMEOUT,
    REGISTRY_CAPACITY,
};
pub use report::{error_chain, ErrorReporter, TracingReporter};
pub use run::Run;

#[cfg(any(test, feature = "test-support"))]
pub use report::FakeReporter;
