//! Settings inspection and first-run behavior

use crate::prelude::*;

#[test]
fn path_points_into_config_dir() {
    let temp = Project::empty();
    let expected = format!("{}\n", temp.config_path().join("settings.json").display());
    temp.pq().args(&["settings", "path"]).passes().stdout_eq(&expected);
}

#[test]
fn first_run_writes_defaults() {
    let temp = Project::empty();

    let run = temp.pq().args(&["settings", "show"]).passes();

    let shown: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    assert_eq!(shown["version"], 4);
    assert_eq!(shown["app"]["uploadMode"], "add-queue");
    assert_eq!(shown["preferences"]["body"]["executions"], 1);
    assert_eq!(temp.read_settings(), shown);
}

#[test]
fn v1_document_is_migrated_and_saved() {
    let temp = Project::empty();
    temp.settings(
        r#"{
            "processing": { "useCpu": true },
            "preferences": {
                "executions": 3,
                "scaleMode": "resize",
                "sizes": { "torso": 1.5 },
                "randomize": { "torso": true },
                "progressive": { "torso": false }
            }
        }"#,
    );

    let run = temp.pq().args(&["settings", "show"]).passes();

    let shown: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    assert_eq!(shown["version"], 4);
    assert_eq!(shown["processing"]["device"], "CPU");
    assert_eq!(shown["preferences"]["body"]["executions"], 3);
    assert_eq!(
        shown["preferences"]["body"]["torso"],
        serde_json::json!({ "size": 1.5, "randomize": true, "progressive": false })
    );
    assert_eq!(shown["preferences"]["advanced"]["scaleMode"], "resize");
    assert_eq!(temp.read_settings()["version"], 4);
}

#[test]
fn newer_document_is_an_error() {
    let temp = Project::empty();
    temp.settings(r#"{"version": 99}"#);
    temp.pq().args(&["settings", "show"]).fails().stderr_has("99");
}
