// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI specs: version, configtest, one-shot runs and stats.

use super::prelude::{is_version_name, stdout_of, Project};
use serial_test::serial;

#[test]
fn version_flag_names_the_tool() {
    let project = Project::empty();
    let assert = project.usbackup().arg("--version").assert().success();
    assert!(stdout_of(&assert).contains("usbackup"));
}

#[test]
fn configtest_accepts_a_valid_config() {
    let project = Project::empty();
    let config = project.minimal_config();

    let assert = project
        .usbackup()
        .args(["--config", &config.display().to_string(), "configtest"])
        .assert()
        .success();
    assert!(stdout_of(&assert).contains("valid"));
}

#[test]
fn configtest_rejects_broken_yaml_with_exit_2() {
    let project = Project::empty();
    let config = project.file("config.yml", "sources: [not: {valid");

    project
        .usbackup()
        .args(["--config", &config.display().to_string(), "configtest"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn configtest_rejects_bad_references_with_exit_2() {
    let project = Project::empty();
    let config = project.file(
        "config.yml",
        r#"
jobs:
  - { name: j, dest: nowhere }
"#,
    );

    let assert = project
        .usbackup()
        .args(["--config", &config.display().to_string(), "configtest"])
        .assert()
        .failure()
        .code(2);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("unknown dest storage"));
}

#[test]
fn missing_config_file_is_exit_2() {
    let project = Project::empty();
    let missing = project.path().join("nope.yml");

    project
        .usbackup()
        .args(["--config", &missing.display().to_string(), "configtest"])
        .assert()
        .failure()
        .code(2);
}

#[test]
#[serial]
fn one_shot_run_creates_a_version() {
    let project = Project::empty();
    let config = project.minimal_config();

    let assert = project
        .usbackup()
        .args([
            "--config",
            &config.display().to_string(),
            "run",
            "--dest",
            "main",
        ])
        .assert()
        .success();
    assert!(stdout_of(&assert).contains("local: OK"));

    let source_root = project.path().join("storage/local");
    let versions: Vec<String> = std::fs::read_dir(&source_root)
        .expect("source root exists")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| is_version_name(name))
        .collect();
    assert_eq!(versions.len(), 1, "exactly one version: {versions:?}");

    // the lock is gone once the run completed
    assert!(!source_root.join("backup.lock").exists());
}

#[test]
#[serial]
fn one_shot_run_with_unknown_storage_fails() {
    let project = Project::empty();
    let config = project.minimal_config();

    let assert = project
        .usbackup()
        .args([
            "--config",
            &config.display().to_string(),
            "run",
            "--dest",
            "nowhere",
        ])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("unknown storage"));
}

#[test]
#[serial]
fn stats_renders_on_a_fresh_state() {
    let project = Project::empty();

    let assert = project.usbackup().arg("stats").assert().success();
    assert!(stdout_of(&assert).contains("Service:"));
}

#[test]
#[serial]
fn stats_json_is_parseable() {
    let project = Project::empty();

    let assert = project
        .usbackup()
        .args(["stats", "--json"])
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_str(&stdout_of(&assert)).expect("valid JSON");
    assert!(json.get("backups").is_some());
}
