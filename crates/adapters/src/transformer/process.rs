// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transformer backed by an external engine program.
//!
//! Invocation:
//!
//! ```text
//! <engine> --input <in> --output <out> --device <GPU|CPU> --preferences <json>
//! <engine> --input <in> --output <out> --crop <WxH+X+Y>
//! ```
//!
//! A zero exit status plus an existing output file is success.

use super::{TransformError, TransformRequest, TransformerAdapter};
use crate::subprocess::{run_with_timeout, stderr_tail, CROP_TIMEOUT, TRANSFORM_TIMEOUT};
use async_trait::async_trait;
use pq_core::CropRegion;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

#[derive(Clone, Debug)]
pub struct ProcessTransformer {
    program: PathBuf,
}

impl ProcessTransformer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--input").arg(input).arg("--output").arg(output);
        cmd
    }
}

#[async_trait]
impl TransformerAdapter for ProcessTransformer {
    async fn transform(&self, request: TransformRequest) -> Result<PathBuf, TransformError> {
        let preferences = serde_json::to_string(&request.preferences)
            .map_err(|e| TransformError::Preferences(e.to_string()))?;
        ensure_parent(&request.output).await?;

        let mut cmd = self.command(&request.input, &request.output);
        cmd.arg("--device")
            .arg(request.device.to_string())
            .arg("--preferences")
            .arg(preferences);

        tracing::info!(
            token = %request.token,
            input = %request.input.display(),
            device = %request.device,
            "starting transform",
        );
        let output = run_with_timeout(cmd, TRANSFORM_TIMEOUT, "transform").await?;
        check_exit(&output)?;

        if !request.output.exists() {
            return Err(TransformError::MissingOutput(request.output));
        }
        tracing::info!(token = %request.token, output = %request.output.display(), "transform finished");
        Ok(request.output)
    }

    async fn crop(
        &self,
        source: &Path,
        region: CropRegion,
        dest: &Path,
    ) -> Result<(), TransformError> {
        ensure_parent(dest).await?;

        let mut cmd = self.command(source, dest);
        cmd.arg("--crop").arg(region.to_string());

        tracing::debug!(source = %source.display(), %region, "cropping");
        let output = run_with_timeout(cmd, CROP_TIMEOUT, "crop").await?;
        check_exit(&output)?;

        if !dest.exists() {
            return Err(TransformError::MissingOutput(dest.to_path_buf()));
        }
        Ok(())
    }
}

fn check_exit(output: &Output) -> Result<(), TransformError> {
    if output.status.success() {
        return Ok(());
    }
    let code = output
        .status
        .code()
        .map(|c| format!("status {c}"))
        .unwrap_or_else(|| "signal".to_string());
    Err(TransformError::Exit {
        code,
        message: stderr_tail(output),
    })
}

async fn ensure_parent(path: &Path) -> Result<(), TransformError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransformError::Failed(format!("{}: {e}", parent.display())))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
