// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use usbackup_core::{BackupRecord, FailureKind, RunFailure};

fn record(source: &str, error: Option<RunFailure>) -> BackupRecord {
    BackupRecord {
        source: source.to_string(),
        dest: format!("/srv/backups/{source}"),
        date: "2025-06-02 00:00:00".to_string(),
        elapsed_secs: 12.5,
        error,
    }
}

#[test]
fn load_of_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let datastore = Datastore::open(dir.path().join("usbackup.db")).unwrap();

    let stats = ServiceStats::load(&datastore);
    assert!(!stats.running);
    assert_eq!(stats.last_manual_run, None);
    assert!(stats.backups.is_empty());

    let text = stats.render();
    assert!(text.contains("Service: not running"));
    assert!(text.contains("Last scheduled run: never"));
    assert!(text.contains("Backups: none recorded"));
}

#[test]
fn render_draws_one_branch_per_source() {
    let dir = tempfile::tempdir().unwrap();
    let datastore = Datastore::open(dir.path().join("usbackup.db")).unwrap();
    datastore.set("running", &true).unwrap();

    let mut backups = BackupsMap::new();
    backups.insert("web01".to_string(), record("web01", None));
    backups.insert(
        "db01".to_string(),
        record(
            "db01",
            Some(RunFailure::new(FailureKind::Unreachable, "host down")),
        ),
    );
    datastore.set(BACKUPS_KEY, &backups).unwrap();

    let stats = ServiceStats::load(&datastore);
    let text = stats.render();

    assert!(text.contains("Service: running"));
    assert!(text.contains("├── web01: OK at 2025-06-02 00:00:00 (12.50s) -> /srv/backups/web01"));
    assert!(text.contains("└── db01: Failed (host down)"));
}

#[test]
fn json_shape_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let datastore = Datastore::open(dir.path().join("usbackup.db")).unwrap();
    datastore
        .set("last_scheduled_run", &"2025-06-02 00:00:00")
        .unwrap();

    let stats = ServiceStats::load(&datastore);
    let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
    assert_eq!(json["running"], false);
    assert_eq!(json["last_scheduled_run"], "2025-06-02 00:00:00");
    assert!(json["backups"].is_object());
}
