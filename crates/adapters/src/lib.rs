// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O

pub mod download;
pub mod env;
pub mod file;
pub mod notify;
pub mod subprocess;
pub mod transformer;

pub use download::{parse_http_url, DownloadError, Downloader, HttpDownloader, UrlError};
pub use file::{FileError, PhotoFile, SUPPORTED_MIME_TYPES};
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};
pub use transformer::{ProcessTransformer, TransformError, TransformRequest, TransformerAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use download::FakeDownloader;
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use transformer::{CropCall, FakeTransformer, TransformCall};
