//! Top-level help and usage

use crate::prelude::*;

#[test]
fn no_subcommand_prints_help() {
    let temp = Project::empty();
    temp.pq()
        .passes()
        .stdout_has("Usage: pq")
        .stdout_has("process")
        .stdout_has("settings");
}

#[test]
fn process_help_lists_flags() {
    let temp = Project::empty();
    temp.pq()
        .args(&["process", "--help"])
        .passes()
        .stdout_has("--url")
        .stdout_has("--engine")
        .stdout_has("--executions")
        .stdout_has("--device");
}
