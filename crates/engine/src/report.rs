// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink for failures that happen off the caller's path (queued work).

use std::error::Error;

/// Receives errors from runs and photo cycles.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, context: &str, error: &dyn Error);
}

/// Render an error and its sources, skipping causes already in the text.
pub fn error_chain(error: &dyn Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !chain.contains(&text) {
            chain.push_str(": ");
            chain.push_str(&text);
        }
        source = cause.source();
    }
    chain
}

/// Logs each error at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, context: &str, error: &dyn Error) {
        tracing::error!(context, error = %error_chain(error), "background failure");
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeReporter;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records `(context, rendered error)` pairs.
    #[derive(Clone, Default)]
    pub struct FakeReporter {
        reports: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl FakeReporter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reports(&self) -> Vec<(String, String)> {
            self.reports.lock().clone()
        }
    }

    impl ErrorReporter for FakeReporter {
        fn report(&self, context: &str, error: &dyn Error) {
            self.reports
                .lock()
                .push((context.to_string(), error_chain(error)));
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
