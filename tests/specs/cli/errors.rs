//! Submission errors exit non-zero and name the problem

use crate::prelude::*;

#[test]
fn nothing_to_process() {
    let temp = Project::empty();
    temp.pq()
        .args(&["process"])
        .fails()
        .code(2)
        .stderr_has("nothing to process");
}

#[test]
fn missing_engine() {
    let temp = Project::empty();
    temp.file("a.png", b"a");
    temp.pq()
        .args(&["process", "a.png"])
        .fails()
        .stderr_has("no transformer configured");
}

#[test]
fn missing_file() {
    let temp = Project::empty();
    let engine = temp.engine("engine.sh", COPY_ENGINE);
    temp.pq()
        .args(&["process", "nope.png", "--engine"])
        .args(&[engine.to_str().unwrap()])
        .fails()
        .stderr_has("cannot submit nope.png")
        .stderr_has("no such file or directory");
}

#[test]
fn unsupported_file_type() {
    let temp = Project::empty();
    let engine = temp.engine("engine.sh", COPY_ENGINE);
    temp.file("notes.txt", b"hello");
    temp.pq()
        .args(&["process", "notes.txt", "--engine"])
        .args(&[engine.to_str().unwrap()])
        .fails()
        .stderr_has("unsupported file type text/plain");
}

#[test]
fn non_http_url() {
    let temp = Project::empty();
    let engine = temp.engine("engine.sh", COPY_ENGINE);
    temp.pq()
        .args(&["process", "--url", "ftp://example.com/a.png", "--engine"])
        .args(&[engine.to_str().unwrap()])
        .fails()
        .stderr_has("unsupported URL scheme 'ftp'");
}
