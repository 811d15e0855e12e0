// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pq_core::{Device, Preferences};
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

/// Write an executable `sh` engine script into `dir`.
fn engine_script(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("engine.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn request(dir: &TempDir, device: Device) -> TransformRequest {
    let input = dir.path().join("in.png");
    std::fs::write(&input, b"pixels").unwrap();
    TransformRequest {
        token: "tok-1".to_string(),
        input,
        output: dir.path().join("out").join("in-1.png"),
        device,
        preferences: Preferences::default(),
    }
}

#[tokio::test]
async fn successful_engine_returns_output_path() {
    let dir = TempDir::new().unwrap();
    let transformer = ProcessTransformer::new(engine_script(&dir, r#"cp "$2" "$4""#));
    let req = request(&dir, Device::Gpu);
    let expected = req.output.clone();

    let output = transformer.transform(req).await.unwrap();

    assert_eq!(output, expected);
    assert_eq!(std::fs::read(&output).unwrap(), b"pixels");
}

#[tokio::test]
async fn engine_receives_device_and_preferences() {
    for (device, flag) in [(Device::Gpu, "--device GPU"), (Device::Cpu, "--device CPU")] {
        let dir = TempDir::new().unwrap();
        let transformer = ProcessTransformer::new(engine_script(&dir, r#"echo "$@" > "$4""#));

        let output = transformer.transform(request(&dir, device)).await.unwrap();

        let args = std::fs::read_to_string(output).unwrap();
        assert!(args.contains(flag), "got: {args}");
        assert!(
            args.contains(r#"--preferences {"body":{"executions":1}"#),
            "got: {args}"
        );
    }
}

#[tokio::test]
async fn nonzero_exit_carries_stderr() {
    let dir = TempDir::new().unwrap();
    let transformer =
        ProcessTransformer::new(engine_script(&dir, "echo 'model missing' >&2\nexit 3"));

    let err = transformer
        .transform(request(&dir, Device::Gpu))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransformError::Exit {
            code: "status 3".to_string(),
            message: "model missing".to_string(),
        }
    );
}

#[tokio::test]
async fn success_without_output_is_an_error() {
    let dir = TempDir::new().unwrap();
    let transformer = ProcessTransformer::new(engine_script(&dir, "exit 0"));
    let req = request(&dir, Device::Gpu);
    let expected = req.output.clone();

    let err = transformer.transform(req).await.unwrap_err();
    assert_eq!(err, TransformError::MissingOutput(expected));
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let transformer = ProcessTransformer::new(dir.path().join("no-such-engine"));

    let err = transformer
        .transform(request(&dir, Device::Cpu))
        .await
        .unwrap_err();
    assert!(matches!(err, TransformError::Spawn(_)), "got: {err:?}");
}

#[tokio::test]
async fn crop_passes_region() {
    let dir = TempDir::new().unwrap();
    let transformer = ProcessTransformer::new(engine_script(&dir, r#"echo "$@" > "$4""#));
    let dest = dir.path().join("crop.png");

    transformer
        .crop(&dir.path().join("in.png"), CropRegion::new(1, 2, 10, 20), &dest)
        .await
        .unwrap();

    let args = std::fs::read_to_string(dest).unwrap();
    assert!(args.contains("--crop 10x20+1+2"), "got: {args}");
}

#[tokio::test]
async fn terminate_is_unsupported() {
    let transformer = ProcessTransformer::new("engine");
    assert!(!transformer.terminate("tok-1").await.unwrap());
}
