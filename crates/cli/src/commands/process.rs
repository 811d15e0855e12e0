// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pq process <paths>...` - Run photos through the transformer and wait

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pq_adapters::{
    DesktopNotifyAdapter, HttpDownloader, NoOpNotifyAdapter, NotifyAdapter, ProcessTransformer,
};
use pq_core::{Device, Settings, SystemClock, UploadMode};
use pq_engine::{EngineDeps, Photo, Registry, RegistryConfig, TracingReporter};
use pq_storage::SettingsStore;

use crate::exit_error::ExitError;
use crate::output::{print_summaries, OutputFormat, PhotoSummary};

#[derive(Args)]
pub struct ProcessArgs {
    /// Image files, or directories of images
    pub paths: Vec<PathBuf>,

    /// http(s) image URL to download and process (repeatable)
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// Transformer program (overrides PQ_ENGINE and processing.engine)
    #[arg(long)]
    pub engine: Option<PathBuf>,

    /// Runs per photo
    #[arg(long)]
    pub executions: Option<u32>,

    /// Compute device
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,

    /// Directory for run outputs and downloads
    #[arg(long, default_value = "pq-output")]
    pub out_dir: PathBuf,

    /// Send desktop notifications
    #[arg(long)]
    pub notify: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Gpu,
    Cpu,
}

impl From<DeviceArg> for Device {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Gpu => Device::Gpu,
            DeviceArg::Cpu => Device::Cpu,
        }
    }
}

/// Apply command-line overrides to a settings snapshot.
///
/// Photos are always queued on submission, whatever the saved upload mode.
fn apply_overrides(mut settings: Settings, args: &ProcessArgs) -> Settings {
    settings.app.upload_mode = UploadMode::AddQueue;
    if let Some(n) = args.executions {
        settings.preferences.body.executions = n;
    }
    if let Some(device) = args.device {
        settings.processing.device = device.into();
    }
    settings
}

/// Flag, then environment, then the settings document.
fn resolve_engine(flag: Option<PathBuf>, settings: &Settings) -> Result<PathBuf> {
    flag.or_else(pq_adapters::env::engine_program)
        .or_else(|| settings.processing.engine.clone())
        .context("no transformer configured: pass --engine, set PQ_ENGINE, or set processing.engine")
}

pub async fn handle(args: ProcessArgs, store: &SettingsStore, format: OutputFormat) -> Result<()> {
    if args.paths.is_empty() && args.urls.is_empty() {
        return Err(ExitError::new(2, "nothing to process: give a path or --url").into());
    }

    let settings = apply_overrides(store.snapshot(), &args);
    let engine = resolve_engine(args.engine.clone(), &settings)?;
    tracing::debug!(engine = %engine.display(), "using transformer");

    // Overrides apply to this invocation only; the saved document is untouched.
    let store = SettingsStore::in_memory(settings);
    if args.notify {
        process(args, store, engine, DesktopNotifyAdapter::new(), format).await
    } else {
        process(args, store, engine, NoOpNotifyAdapter::new(), format).await
    }
}

async fn process<N: NotifyAdapter>(
    args: ProcessArgs,
    store: SettingsStore,
    engine: PathBuf,
    notifier: N,
    format: OutputFormat,
) -> Result<()> {
    let registry = Registry::new(
        store,
        EngineDeps {
            transformer: ProcessTransformer::new(engine),
            notifier,
            downloader: HttpDownloader::new()?,
            reporter: Arc::new(TracingReporter),
        },
        SystemClock,
        RegistryConfig::new(&args.out_dir),
    );

    let mut submitted = Vec::new();
    for path in &args.paths {
        let added = registry
            .add_file(path)
            .await
            .with_context(|| format!("cannot submit {}", path.display()))?;
        if added.is_empty() {
            tracing::info!(path = %path.display(), "nothing new to process");
        }
        submitted.extend(added);
    }
    for url in &args.urls {
        let added = registry
            .add_url(url)
            .await
            .with_context(|| format!("cannot submit {url}"))?;
        submitted.extend(added);
    }

    let interrupted = tokio::select! {
        _ = registry.wait_idle() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracing::warn!("interrupted, abandoning queued photos");
        for photo in registry.photos() {
            registry.remove_from_queue(&photo);
        }
    }

    let summaries: Vec<_> = submitted.iter().map(|p| summarize(p)).collect();
    print_summaries(&summaries, format)?;

    if interrupted {
        return Err(ExitError::new(130, "").into());
    }
    Ok(())
}

fn summarize<N: NotifyAdapter>(
    photo: &Photo<ProcessTransformer, N, SystemClock>,
) -> PhotoSummary {
    let (runs_ok, runs_total) = photo.run_counts();
    PhotoSummary {
        id: photo.id().to_string(),
        name: photo.name(),
        status: photo.status(),
        runs_ok,
        runs_total,
        elapsed: photo.elapsed(),
        outputs: photo.runs().iter().filter_map(|r| r.output()).collect(),
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
