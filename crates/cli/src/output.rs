// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use pq_core::{format_duration, PhotoStatus};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Final state of one processed photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoSummary {
    pub id: String,
    pub name: String,
    pub status: PhotoStatus,
    pub runs_ok: usize,
    pub runs_total: usize,
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub outputs: Vec<PathBuf>,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl PhotoSummary {
    /// `<short id>  <status>  <ok>/<total>  <elapsed>  <name>`
    pub fn line(&self) -> String {
        format!(
            "{}  {}  {}/{}  {}  {}",
            pq_core::ShortId::short(self.id.as_str(), pq_core::SHORT_ID_LEN),
            self.status,
            self.runs_ok,
            self.runs_total,
            format_duration(self.elapsed),
            self.name,
        )
    }
}

pub fn print_summaries(summaries: &[PhotoSummary], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for summary in summaries {
                println!("{}", summary.line());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summaries)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
