// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::ConfigError;

fn errors_of(text: &str) -> Vec<String> {
    match crate::parse(text) {
        Err(ConfigError::Invalid(errors)) => errors,
        other => panic!("expected validation errors, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn duplicate_names_are_reported() {
    let errors = errors_of(
        r#"
sources:
  - { name: a, host: localhost }
  - { name: a, host: localhost }
storages:
  - { name: main, path: /srv/backups }
  - { name: main, path: /srv/other }
"#,
    );
    assert!(errors.iter().any(|e| e.contains("duplicate source name")));
    assert!(errors.iter().any(|e| e.contains("duplicate storage name")));
}

#[test]
fn unknown_dest_storage() {
    let errors = errors_of(
        r#"
jobs:
  - { name: j, dest: nowhere }
"#,
    );
    assert!(errors.iter().any(|e| e.contains("unknown dest storage")));
}

#[test]
fn replication_requires_replicate() {
    let errors = errors_of(
        r#"
storages:
  - { name: main, path: /srv/backups }
jobs:
  - { name: j, type: replication, dest: main }
"#,
    );
    assert!(errors.iter().any(|e| e.contains("require a \"replicate\"")));
}

#[test]
fn replication_onto_itself_is_rejected() {
    let errors = errors_of(
        r#"
storages:
  - { name: main, path: /srv/backups }
jobs:
  - { name: j, type: replication, dest: main, replicate: main }
"#,
    );
    assert!(errors.iter().any(|e| e.contains("onto itself")));
}

#[test]
fn replicate_on_backup_job_is_rejected() {
    let errors = errors_of(
        r#"
storages:
  - { name: main, path: /srv/backups }
  - { name: other, path: /srv/other }
jobs:
  - { name: j, dest: main, replicate: other }
"#,
    );
    assert!(errors
        .iter()
        .any(|e| e.contains("only valid for replication")));
}

#[test]
fn limit_and_exclude_must_reference_sources() {
    let errors = errors_of(
        r#"
sources:
  - { name: a, host: localhost }
storages:
  - { name: main, path: /srv/backups }
jobs:
  - { name: j, dest: main, limit: [a, ghost], exclude: [phantom] }
"#,
    );
    assert_eq!(
        errors
            .iter()
            .filter(|e| e.contains("unknown source"))
            .count(),
        2
    );
}

#[test]
fn valid_config_passes() {
    let config = crate::parse(
        r#"
sources:
  - { name: a, host: localhost }
storages:
  - { name: main, path: /srv/backups }
jobs:
  - { name: j, dest: main, limit: [a] }
"#,
    )
    .unwrap();
    assert_eq!(config.jobs[0].limit, vec!["a"]);
}
