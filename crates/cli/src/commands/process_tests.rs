// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn args() -> ProcessArgs {
    ProcessArgs {
        paths: vec![PathBuf::from("a.png")],
        urls: Vec::new(),
        engine: None,
        executions: None,
        device: None,
        out_dir: PathBuf::from("pq-output"),
        notify: false,
    }
}

#[test]
fn overrides_force_queueing_and_keep_other_settings() {
    let mut saved = Settings::default();
    saved.app.upload_mode = UploadMode::GoPreferences;
    saved.preferences.body.executions = 4;

    let settings = apply_overrides(saved, &args());

    assert_eq!(settings.app.upload_mode, UploadMode::AddQueue);
    assert_eq!(settings.preferences.body.executions, 4);
    assert_eq!(settings.processing.device, Device::Gpu);
}

#[test]
fn flags_override_executions_and_device() {
    let args = ProcessArgs {
        executions: Some(0),
        device: Some(DeviceArg::Cpu),
        ..args()
    };

    let settings = apply_overrides(Settings::default(), &args);

    assert_eq!(settings.preferences.body.executions, 0);
    assert_eq!(settings.processing.device, Device::Cpu);
}

#[test]
fn engine_flag_wins() {
    let mut settings = Settings::default();
    settings.processing.engine = Some(PathBuf::from("/opt/saved-engine"));

    let engine = resolve_engine(Some(PathBuf::from("/usr/bin/flag-engine")), &settings).unwrap();

    assert_eq!(engine, PathBuf::from("/usr/bin/flag-engine"));
}
