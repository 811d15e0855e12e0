// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    pending  = { PhotoStatus::Pending, "pending" },
    waiting  = { PhotoStatus::Waiting, "waiting" },
    running  = { PhotoStatus::Running, "running" },
    finished = { PhotoStatus::Finished, "finished" },
)]
fn photo_status_display_and_parse_agree(status: PhotoStatus, text: &str) {
    assert_eq!(status.to_string(), text);
    assert_eq!(text.parse::<PhotoStatus>().unwrap(), status);
    assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{text}\""));
}

#[test]
fn photo_status_parse_rejects_unknown() {
    let err = "done".parse::<PhotoStatus>().unwrap_err();
    assert_eq!(err.to_string(), "unknown photo status: done");
}

#[test]
fn only_waiting_and_running_are_active() {
    assert!(!PhotoStatus::Pending.is_active());
    assert!(PhotoStatus::Waiting.is_active());
    assert!(PhotoStatus::Running.is_active());
    assert!(!PhotoStatus::Finished.is_active());
}

#[test]
fn default_status_is_pending() {
    assert_eq!(PhotoStatus::default(), PhotoStatus::Pending);
}

#[test]
fn crop_region_display_uses_geometry_notation() {
    let region = CropRegion::new(10, 20, 512, 256);
    assert_eq!(region.to_string(), "512x256+10+20");
    assert!(!region.is_empty());
    assert!(CropRegion::new(0, 0, 0, 10).is_empty());
}

#[test]
fn photo_event_serializes_with_type_tag() {
    let event = PhotoEvent::Finished {
        id: PhotoId::new("abc"),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "photo:finished");
    assert_eq!(json["id"], "abc");
}
