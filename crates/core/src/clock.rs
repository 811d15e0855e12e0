// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so debounce windows and stopwatches can be driven by tests.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch
    fn epoch_ms(&self) -> u64;
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeClock;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct FakeTime {
        instant: Instant,
        epoch_ms: u64,
    }

    /// Manually advanced clock. Clones share the same time.
    #[derive(Clone)]
    pub struct FakeClock {
        inner: Arc<Mutex<FakeTime>>,
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeTime {
                    instant: Instant::now(),
                    epoch_ms: 1_700_000_000_000,
                })),
            }
        }

        /// Move both clocks forward by `by`.
        pub fn advance(&self, by: Duration) {
            let mut time = self.inner.lock();
            time.instant += by;
            time.epoch_ms += by.as_millis() as u64;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.inner.lock().instant
        }

        fn epoch_ms(&self) -> u64 {
            self.inner.lock().epoch_ms
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
