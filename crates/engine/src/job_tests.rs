// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;
use tempfile::TempDir;
use usbackup_core::FakeClock;

fn clock() -> FakeClock {
    FakeClock::new(
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(3, 15, 0)
            .unwrap(),
    )
}

struct Setup {
    storage: TempDir,
    _state: TempDir,
    cleanup: Arc<CleanupQueue>,
    datastore: Arc<Datastore>,
}

impl Setup {
    fn new() -> Self {
        let state = tempfile::tempdir().unwrap();
        let datastore = Arc::new(Datastore::open(state.path().join("usbackup.db")).unwrap());
        Setup {
            storage: tempfile::tempdir().unwrap(),
            _state: state,
            cleanup: Arc::new(CleanupQueue::new()),
            datastore,
        }
    }

    /// A config with two local handler-less sources and one storage named
    /// "main" rooted in the tempdir.
    fn config(&self) -> Config {
        let text = format!(
            r#"
sources:
  - {{ name: web01, host: localhost }}
  - {{ name: db01, host: localhost }}
storages:
  - {{ name: main, path: {} }}
"#,
            self.storage.path().display()
        );
        usbackup_config::parse(&text).unwrap()
    }

    fn job(&self, overrides: impl FnOnce(&mut JobSpec)) -> JobSpec {
        let mut job = JobSpec {
            name: "nightly".to_string(),
            kind: JobKind::Backup,
            dest: "main".to_string(),
            replicate: None,
            limit: Vec::new(),
            exclude: Vec::new(),
            schedule: "15 3 * * *".parse().unwrap(),
            retention_policy: None,
            notification_policy: usbackup_config::NotificationPolicy::Never,
            concurrency: 2,
            pre_run_cmd: Vec::new(),
            post_run_cmd: Vec::new(),
        };
        overrides(&mut job);
        job
    }

    fn coordinator(&self, job: JobSpec) -> JobCoordinator<FakeClock> {
        JobCoordinator::new(
            job,
            &self.config(),
            Arc::clone(&self.cleanup),
            Arc::clone(&self.datastore),
            clock(),
        )
    }
}

#[tokio::test]
async fn runs_every_source_and_persists_records() {
    let setup = Setup::new();
    let coordinator = setup.coordinator(setup.job(|_| {}));

    let results = coordinator.run().await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(RunResult::is_ok));

    // one version directory per source
    for source in ["web01", "db01"] {
        assert!(setup
            .storage
            .path()
            .join(source)
            .join("2025_06_02-03_15_00")
            .is_dir());
        assert!(!setup.storage.path().join(source).join("backup.lock").exists());
    }

    let backups: BackupsMap = setup.datastore.get(BACKUPS_KEY).unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups["web01"].error.is_none());
}

#[tokio::test]
async fn is_due_follows_the_schedule() {
    let setup = Setup::new();
    let coordinator = setup.coordinator(setup.job(|_| {}));

    assert!(coordinator.is_due(clock().now()));
    assert!(!coordinator.is_due(clock().now() + chrono::Duration::minutes(1)));
}

#[tokio::test]
async fn limit_and_exclude_filter_sources() {
    let setup = Setup::new();
    let coordinator = setup.coordinator(setup.job(|job| {
        job.limit = vec!["web01".to_string(), "db01".to_string()];
        job.exclude = vec!["db01".to_string()];
    }));

    let results = coordinator.run().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source, "web01");
    assert!(!setup.storage.path().join("db01").exists());
}

#[tokio::test]
async fn empty_selection_is_a_hard_failure() {
    let setup = Setup::new();
    let coordinator = setup.coordinator(setup.job(|job| {
        job.exclude = vec!["web01".to_string(), "db01".to_string()];
    }));

    assert!(matches!(
        coordinator.run().await,
        Err(EngineError::NoSources(_))
    ));
}

#[tokio::test]
async fn unknown_storage_is_a_hard_failure() {
    let setup = Setup::new();
    let coordinator = setup.coordinator(setup.job(|job| {
        job.dest = "nowhere".to_string();
    }));

    assert!(matches!(
        coordinator.run().await,
        Err(EngineError::UnknownStorage(name)) if name == "nowhere"
    ));
}

#[tokio::test]
async fn pre_run_failure_aborts_before_any_runner() {
    let setup = Setup::new();
    let coordinator = setup.coordinator(setup.job(|job| {
        job.pre_run_cmd = vec!["false".to_string()];
    }));

    assert!(coordinator.run().await.is_err());
    // no runner launched, no source directory created
    assert!(!setup.storage.path().join("web01").exists());
}

#[tokio::test]
async fn post_run_failure_does_not_flip_job_status() {
    let setup = Setup::new();
    let coordinator = setup.coordinator(setup.job(|job| {
        job.post_run_cmd = vec!["false".to_string()];
    }));

    let results = coordinator.run().await.unwrap();
    assert!(results.iter().all(RunResult::is_ok));
}

#[tokio::test]
async fn runner_failures_do_not_fail_the_job() {
    let setup = Setup::new();

    // seed a lock so web01 fails with AlreadyRunning while db01 succeeds
    std::fs::create_dir_all(setup.storage.path().join("web01")).unwrap();
    std::fs::File::create(setup.storage.path().join("web01/backup.lock")).unwrap();

    let coordinator = setup.coordinator(setup.job(|_| {}));
    let results = coordinator.run().await.unwrap();

    let web01 = results.iter().find(|r| r.source == "web01").unwrap();
    let db01 = results.iter().find(|r| r.source == "db01").unwrap();
    assert_eq!(
        web01.error.as_ref().map(|e| e.kind),
        Some(FailureKind::AlreadyRunning)
    );
    assert!(db01.is_ok());

    let backups: BackupsMap = setup.datastore.get(BACKUPS_KEY).unwrap();
    assert_eq!(
        backups["web01"].error.as_ref().map(|e| e.kind),
        Some(FailureKind::AlreadyRunning)
    );
}

#[tokio::test]
async fn replication_job_replicates_each_source() {
    let setup = Setup::new();
    let offsite = tempfile::tempdir().unwrap();

    let text = format!(
        r#"
sources:
  - {{ name: web01, host: localhost }}
storages:
  - {{ name: main, path: {} }}
  - {{ name: offsite, path: {} }}
"#,
        setup.storage.path().display(),
        offsite.path().display()
    );
    let config = usbackup_config::parse(&text).unwrap();

    // no versions on main yet: replication fails per source, job succeeds
    let job = setup.job(|job| {
        job.name = "mirror".to_string();
        job.kind = JobKind::Replication;
        job.dest = "offsite".to_string();
        job.replicate = Some("main".to_string());
    });
    let coordinator = JobCoordinator::new(
        job,
        &config,
        Arc::clone(&setup.cleanup),
        Arc::clone(&setup.datastore),
        clock(),
    );

    let results = coordinator.run().await.unwrap();
    assert_eq!(results.len(), 1);
    let failure = results[0].error.as_ref().unwrap();
    assert!(failure.message.contains("no backup version"));

    // replication outcomes are not recorded as backups
    assert!(setup.datastore.get::<BackupsMap>(BACKUPS_KEY).is_none());
}
