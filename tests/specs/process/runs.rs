//! End-to-end processing through a script transformer

use crate::prelude::*;

fn process(temp: &Project, engine: &str, extra: &[&str]) -> CliBuilder {
    let engine = temp.engine("engine.sh", engine);
    temp.pq()
        .args(&["process", "--engine"])
        .args(&[engine.to_str().unwrap()])
        .args(extra)
}

#[test]
fn every_run_writes_an_output() {
    let temp = Project::empty();
    temp.file("a.png", b"first");
    temp.file("b.jpg", b"second");

    let run = process(&temp, COPY_ENGINE, &["a.png", "b.jpg", "--executions", "2"]).passes();

    let lines = run.lines();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].contains("  finished  2/2  "), "{}", lines[0]);
    assert!(lines[0].ends_with("  a.png"), "{}", lines[0]);
    assert!(lines[1].ends_with("  b.jpg"), "{}", lines[1]);

    let short = lines[0].split_whitespace().next().unwrap();
    for i in 1..=2 {
        let out = temp.path().join(format!("pq-output/{short}-{i}.png"));
        assert_eq!(std::fs::read(&out).unwrap(), b"first");
    }
}

#[test]
fn failing_engine_still_finishes_the_photo() {
    let temp = Project::empty();
    temp.file("a.png", b"a");

    let run = process(&temp, FAILING_ENGINE, &["a.png", "--executions", "2"]).passes();

    let lines = run.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("  finished  0/2  "), "{}", lines[0]);
}

#[test]
fn zero_executions_leaves_the_photo_pending() {
    let temp = Project::empty();
    temp.file("a.png", b"a");

    let run = process(&temp, COPY_ENGINE, &["a.png", "--executions", "0"]).passes();

    assert!(run.lines()[0].contains("  pending  0/0  "), "{}", run.stdout());
}

#[test]
fn directory_is_expanded_and_duplicates_collapse() {
    let temp = Project::empty();
    temp.file("album/b.png", b"same");
    temp.file("album/a.png", b"other");
    temp.file("album/copy.png", b"same");
    temp.file("album/readme.txt", b"skip me");

    let run = process(&temp, COPY_ENGINE, &["album"]).passes();

    let lines = run.lines();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].ends_with("  a.png"));
    assert!(lines[1].ends_with("  b.png"));
}

#[test]
fn json_output() {
    let temp = Project::empty();
    temp.file("a.png", b"a");

    let run = process(&temp, COPY_ENGINE, &["a.png", "-o", "json"]).passes();

    let value: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    let photo = &value[0];
    assert_eq!(photo["name"], "a.png");
    assert_eq!(photo["status"], "finished");
    assert_eq!(photo["runs_ok"], 1);
    assert_eq!(photo["runs_total"], 1);
    assert_eq!(photo["outputs"].as_array().unwrap().len(), 1);
    assert_eq!(photo["id"].as_str().unwrap().len(), 64);
}

#[test]
fn engine_from_settings_document() {
    let temp = Project::empty();
    let engine = temp.engine("engine.sh", COPY_ENGINE);
    temp.file("a.png", b"a");
    temp.settings(&format!(
        r#"{{"version": 4, "processing": {{"engine": "{}"}}}}"#,
        engine.display()
    ));

    let run = temp.pq().args(&["process", "a.png"]).passes();

    assert!(run.lines()[0].contains("  finished  1/1  "), "{}", run.stdout());
}
