// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;
use nix::sys::signal::{raise, Signal};
use serial_test::serial;
use tempfile::TempDir;
use usbackup_core::FakeClock;

fn clock() -> FakeClock {
    FakeClock::new(
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(12, 0, 30)
            .unwrap(),
    )
}

struct Setup {
    storage: TempDir,
    state: TempDir,
}

impl Setup {
    fn new() -> Self {
        Setup {
            storage: tempfile::tempdir().unwrap(),
            state: tempfile::tempdir().unwrap(),
        }
    }

    fn paths(&self) -> StatePaths {
        StatePaths::under(self.state.path())
    }

    fn config(&self, jobs: &str) -> Config {
        let text = format!(
            r#"
sources:
  - {{ name: web01, host: localhost }}
storages:
  - {{ name: main, path: {} }}
jobs:{}
"#,
            self.storage.path().display(),
            jobs
        );
        usbackup_config::parse(&text).unwrap()
    }

    fn supervisor(&self, jobs: &str) -> Supervisor<FakeClock> {
        Supervisor::with_clock(self.config(jobs), self.paths(), clock()).unwrap()
    }
}

const NIGHTLY: &str = r#"
  - { name: nightly, dest: main, notification_policy: never }"#;

#[tokio::test]
async fn run_once_executes_the_first_configured_job() {
    let setup = Setup::new();
    let supervisor = setup.supervisor(NIGHTLY);

    let results = supervisor.run_once(None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
    assert_eq!(supervisor.state(), SupervisorState::Exited);

    assert!(setup
        .storage
        .path()
        .join("web01/2025_06_02-12_00_30")
        .is_dir());
    assert_eq!(
        supervisor
            .datastore()
            .get::<String>("last_manual_run")
            .as_deref(),
        Some("2025-06-02 12:00:30")
    );
}

#[tokio::test]
async fn run_once_without_jobs_is_an_error() {
    let setup = Setup::new();
    let supervisor = setup.supervisor("\n  []");

    assert!(matches!(
        supervisor.run_once(None).await,
        Err(SupervisorError::NoJobs)
    ));
}

#[tokio::test]
async fn run_once_accepts_a_synthesized_job() {
    let setup = Setup::new();
    let supervisor = setup.supervisor(NIGHTLY);

    let mut job = setup.config(NIGHTLY).jobs[0].clone();
    job.name = "manual-20250602120030".to_string();
    job.limit = vec!["web01".to_string()];

    let results = supervisor.run_once(Some(job)).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
#[serial]
async fn daemon_refuses_to_start_twice() {
    let setup = Setup::new();
    std::fs::write(setup.paths().pid_file, "12345\n").unwrap();

    let supervisor = setup.supervisor(NIGHTLY);
    assert!(matches!(
        supervisor.run_daemon().await,
        Err(SupervisorError::AlreadyRunning(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn sigterm_drains_and_removes_the_pid_file() {
    let setup = Setup::new();
    let supervisor = Arc::new(setup.supervisor(NIGHTLY));

    let daemon = {
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move { supervisor.run_daemon().await })
    };

    // wait until the daemon is running and its pid file exists
    for _ in 0..100 {
        if supervisor.state() == SupervisorState::Running && setup.paths().pid_file.exists() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(supervisor.state(), SupervisorState::Running);

    raise(Signal::SIGTERM).unwrap();

    daemon.await.unwrap().unwrap();
    assert_eq!(supervisor.state(), SupervisorState::Exited);
    assert!(!setup.paths().pid_file.exists());
    assert_eq!(supervisor.datastore().get::<bool>("running"), Some(false));
}
