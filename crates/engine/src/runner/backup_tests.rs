// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::StubHandler;
use chrono::NaiveDate;
use tempfile::TempDir;
use usbackup_core::FakeClock;

fn clock_at(h: u32, m: u32, s: u32) -> FakeClock {
    FakeClock::new(
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap(),
    )
}

struct Setup {
    dir: TempDir,
    cleanup: Arc<CleanupQueue>,
}

impl Setup {
    fn new() -> Self {
        Setup {
            dir: tempfile::tempdir().unwrap(),
            cleanup: Arc::new(CleanupQueue::new()),
        }
    }

    fn storage_root(&self) -> PathRef {
        PathRef::local(self.dir.path().display().to_string())
    }

    fn runner(
        &self,
        handlers: Vec<Box<dyn BackupHandler>>,
        policy: Option<RetentionPolicy>,
        clock: FakeClock,
    ) -> BackupRunner<FakeClock> {
        let log = RunLog::new();
        let context = BackupContext::new("web01", &self.storage_root(), log.clone());
        BackupRunner::with_handlers(
            context,
            HostEndpoint::localhost(),
            handlers,
            policy,
            Arc::clone(&self.cleanup),
            clock,
            log,
        )
    }

    fn source_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("web01")
    }

    fn version_dirs(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.source_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_dir())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[tokio::test]
async fn successful_run_creates_one_version() {
    let setup = Setup::new();
    let handler = StubHandler::ok("files");
    let calls = handler.calls();

    let result = setup
        .runner(vec![Box::new(handler)], None, clock_at(1, 30, 0))
        .run()
        .await;

    assert!(result.is_ok(), "unexpected failure: {:?}", result.error);
    assert_eq!(result.source, "web01");
    assert_eq!(setup.version_dirs(), vec!["2025_06_02-01_30_00"]);
    assert!(setup
        .source_dir()
        .join("2025_06_02-01_30_00/files/data.txt")
        .is_file());

    // first run has no link-dest
    assert_eq!(calls.lock().len(), 1);
    assert_eq!(calls.lock()[0].1, None);

    // lock released, no cleanup entries left behind
    assert!(!setup.source_dir().join("backup.lock").exists());
    assert!(setup.cleanup.is_empty());
    assert!(!result.log.is_empty());
}

#[tokio::test]
async fn second_run_links_against_the_previous_version() {
    let setup = Setup::new();

    let first = setup
        .runner(vec![Box::new(StubHandler::ok("files"))], None, clock_at(1, 0, 0))
        .run()
        .await;
    assert!(first.is_ok());

    let handler = StubHandler::ok("files");
    let calls = handler.calls();
    let second = setup
        .runner(vec![Box::new(handler)], None, clock_at(2, 0, 0))
        .run()
        .await;
    assert!(second.is_ok());

    let link = calls.lock()[0].1.clone().unwrap();
    assert!(link.ends_with("2025_06_02-01_00_00/files"));
}

#[tokio::test]
async fn handler_failure_rolls_back_the_version() {
    let setup = Setup::new();

    // seed a previous version via a successful run
    let first = setup
        .runner(vec![Box::new(StubHandler::ok("files"))], None, clock_at(1, 0, 0))
        .run()
        .await;
    assert!(first.is_ok());

    // handler A succeeds, handler B raises
    let result = setup
        .runner(
            vec![
                Box::new(StubHandler::ok("files")),
                Box::new(StubHandler::failing("mysql")),
            ],
            None,
            clock_at(2, 0, 0),
        )
        .run()
        .await;

    let failure = result.error.expect("run must fail");
    assert_eq!(failure.kind, FailureKind::Handler);
    assert!(failure.message.contains("mysql"));

    // the partial version is gone, the previous one untouched
    assert_eq!(setup.version_dirs(), vec!["2025_06_02-01_00_00"]);
    assert!(setup
        .source_dir()
        .join("2025_06_02-01_00_00/files/data.txt")
        .is_file());

    // lock released, queue drained
    assert!(!setup.source_dir().join("backup.lock").exists());
    assert!(setup.cleanup.is_empty());
}

#[tokio::test]
async fn existing_lock_fails_without_side_effects() {
    let setup = Setup::new();
    std::fs::create_dir_all(setup.source_dir()).unwrap();
    std::fs::File::create(setup.source_dir().join("backup.lock")).unwrap();

    let result = setup
        .runner(vec![Box::new(StubHandler::ok("files"))], None, clock_at(1, 0, 0))
        .run()
        .await;

    let failure = result.error.expect("run must fail");
    assert_eq!(failure.kind, FailureKind::AlreadyRunning);
    assert!(setup.version_dirs().is_empty());
    // the pre-existing lock is not ours to remove
    assert!(setup.source_dir().join("backup.lock").is_file());
}

#[tokio::test]
async fn concurrent_runs_exclude_each_other() {
    let setup = Setup::new();

    let slow = setup.runner(
        vec![Box::new(StubHandler::slow(
            "files",
            std::time::Duration::from_millis(300),
        ))],
        None,
        clock_at(1, 0, 0),
    );
    let fast = setup.runner(
        vec![Box::new(StubHandler::ok("files"))],
        None,
        clock_at(1, 0, 1),
    );

    let slow_task = tokio::spawn(slow.run());
    // let the slow runner take the lock first
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let fast_result = fast.run().await;

    let failure = fast_result.error.expect("second run must fail");
    assert_eq!(failure.kind, FailureKind::AlreadyRunning);

    let slow_result = slow_task.await.unwrap();
    assert!(slow_result.is_ok());

    // exactly the slow runner's version remains, no partial second version
    assert_eq!(setup.version_dirs(), vec!["2025_06_02-01_00_00"]);
    assert!(!setup.source_dir().join("backup.lock").exists());
}

#[tokio::test]
async fn unreachable_host_fails_without_side_effects() {
    let setup = Setup::new();
    let log = RunLog::new();
    let context = BackupContext::new("web01", &setup.storage_root(), log.clone());
    let host: HostEndpoint = "definitely-unreachable.invalid".parse().unwrap();

    let runner = BackupRunner::with_handlers(
        context,
        host,
        vec![Box::new(StubHandler::ok("files"))],
        None,
        Arc::clone(&setup.cleanup),
        clock_at(1, 0, 0),
        log,
    );

    let result = runner.run().await;
    let failure = result.error.expect("run must fail");
    assert_eq!(failure.kind, FailureKind::Unreachable);
    assert!(!setup.source_dir().exists());
}

#[tokio::test]
async fn retention_runs_after_a_successful_backup() {
    let setup = Setup::new();
    std::fs::create_dir_all(setup.source_dir()).unwrap();
    for name in ["2025_06_01-00_00_00", "2025_06_01-12_00_00"] {
        std::fs::create_dir(setup.source_dir().join(name)).unwrap();
    }

    let policy = RetentionPolicy::parse_spec("last=1").unwrap();
    let result = setup
        .runner(
            vec![Box::new(StubHandler::ok("files"))],
            Some(policy),
            clock_at(6, 0, 0),
        )
        .run()
        .await;

    assert!(result.is_ok(), "unexpected failure: {:?}", result.error);
    // last=1 keeps only the newest version, which is the one just created
    assert_eq!(setup.version_dirs(), vec!["2025_06_02-06_00_00"]);
}

#[tokio::test]
async fn version_clash_fails_fast() {
    let setup = Setup::new();
    std::fs::create_dir_all(setup.source_dir().join("2025_06_02-01_00_00")).unwrap();

    let result = setup
        .runner(vec![Box::new(StubHandler::ok("files"))], None, clock_at(1, 0, 0))
        .run()
        .await;

    let failure = result.error.expect("run must fail");
    assert_eq!(failure.kind, FailureKind::VersionClash);
    // no lock left behind: the clash happens before lock creation
    assert!(!setup.source_dir().join("backup.lock").exists());
}
