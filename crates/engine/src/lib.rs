// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! usbackup-engine: the backup orchestration engine.
//!
//! Per job, the [`JobCoordinator`] fans out one runner per source under a
//! concurrency bound; each [`BackupRunner`] locks its `(source, storage)`
//! workspace, creates a fresh version directory, drives the source's
//! handler chain and applies retention. The [`CleanupQueue`] guarantees
//! lock and temp-artifact release on every exit path, including
//! signal-driven shutdown.

pub mod cleanup;
pub mod context;
pub mod datastore;
pub mod error;
pub mod exec;
pub mod fs;
pub mod handlers;
pub mod job;
pub mod notify;
pub mod retention;
pub mod runlog;
pub mod runner;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cleanup::{CleanupError, CleanupQueue};
pub use context::BackupContext;
pub use datastore::{Datastore, DatastoreError, BACKUPS_KEY};
pub use error::EngineError;
pub use exec::{is_reachable, Cmd, ExecError};
pub use handlers::BackupHandler;
pub use job::JobCoordinator;
pub use notify::{JobStatus, NotificationHandler, Notifier};
pub use runlog::RunLog;
pub use runner::{BackupRunner, ReplicationRunner};
