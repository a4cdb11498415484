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
            .and_hms_opt(12, 0, 0)
            .unwrap(),
    )
}

struct Setup {
    src: TempDir,
    dst: TempDir,
    cleanup: Arc<CleanupQueue>,
}

impl Setup {
    fn new() -> Self {
        Setup {
            src: tempfile::tempdir().unwrap(),
            dst: tempfile::tempdir().unwrap(),
            cleanup: Arc::new(CleanupQueue::new()),
        }
    }

    fn runner(&self) -> ReplicationRunner<FakeClock> {
        ReplicationRunner::new(
            "web01",
            &PathRef::local(self.dst.path().display().to_string()),
            &PathRef::local(self.src.path().display().to_string()),
            None,
            Arc::clone(&self.cleanup),
            clock(),
        )
    }
}

#[tokio::test]
async fn missing_source_version_fails_the_run() {
    let setup = Setup::new();
    std::fs::create_dir_all(setup.src.path().join("web01")).unwrap();

    let result = setup.runner().run().await;
    let failure = result.error.expect("run must fail");
    assert_eq!(failure.kind, FailureKind::Other);
    assert!(failure.message.contains("no backup version"));

    // fails before locking: nothing to release
    assert!(setup.cleanup.is_empty());
    assert!(!setup.dst.path().join("web01/backup.lock").exists());
}

#[tokio::test]
async fn existing_lock_excludes_the_run() {
    let setup = Setup::new();
    std::fs::create_dir_all(setup.src.path().join("web01/2025_06_01-00_00_00")).unwrap();
    std::fs::create_dir_all(setup.dst.path().join("web01")).unwrap();
    std::fs::File::create(setup.dst.path().join("web01/backup.lock")).unwrap();

    let result = setup.runner().run().await;
    let failure = result.error.expect("run must fail");
    assert_eq!(failure.kind, FailureKind::AlreadyRunning);
}

#[tokio::test]
async fn replication_mirrors_the_latest_version() {
    let setup = Setup::new();

    // source storage holds two versions; only the latest replicates
    let src_root = setup.src.path().join("web01");
    std::fs::create_dir_all(src_root.join("2025_06_01-00_00_00/files")).unwrap();
    std::fs::create_dir_all(src_root.join("2025_06_01-12_00_00/files")).unwrap();
    std::fs::write(
        src_root.join("2025_06_01-12_00_00/files/data.txt"),
        "payload",
    )
    .unwrap();

    let result = setup.runner().run().await;

    // rsync may be missing in minimal environments; the contract is a
    // spawn failure in the result, never a panic or a leaked lock
    if result.is_ok() {
        let replicated = setup.dst.path().join("web01/2025_06_01-12_00_00");
        assert!(replicated.join("files/data.txt").is_file());
        assert!(!setup
            .dst
            .path()
            .join("web01/2025_06_01-00_00_00")
            .exists());
    }
    assert!(!setup.dst.path().join("web01/backup.lock").exists());
    assert!(setup.cleanup.is_empty());
}
