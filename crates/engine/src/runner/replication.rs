// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-to-storage replication.
//!
//! The latest version of the replication-source workspace is rsynced
//! wholesale into the destination workspace root, preserving the version
//! directory name, so the destination accumulates its own version list and
//! retention applies to it like any backup destination.

use super::exec_failure;
use crate::cleanup::CleanupQueue;
use crate::context::BackupContext;
use crate::error::EngineError;
use crate::exec;
use crate::fs;
use crate::retention;
use crate::runlog::RunLog;
use std::sync::Arc;
use std::time::Instant;
use usbackup_core::{Clock, FailureKind, PathRef, RetentionPolicy, RunFailure, RunResult};
use uuid::Uuid;

const RSYNC_OPTIONS: [&str; 6] = [
    "--archive",
    "--hard-links",
    "--acls",
    "--xattrs",
    "--delete",
    "--delete-during",
];

pub struct ReplicationRunner<C: Clock> {
    context: BackupContext,
    source: BackupContext,
    policy: Option<RetentionPolicy>,
    cleanup: Arc<CleanupQueue>,
    clock: C,
    log: RunLog,
    id: Uuid,
}

impl<C: Clock> ReplicationRunner<C> {
    pub fn new(
        source_name: &str,
        dest_root: &PathRef,
        replicate_root: &PathRef,
        policy: Option<RetentionPolicy>,
        cleanup: Arc<CleanupQueue>,
        clock: C,
    ) -> Self {
        let log = RunLog::new();

        ReplicationRunner {
            context: BackupContext::new(source_name, dest_root, log.clone()),
            source: BackupContext::new(source_name, replicate_root, log.clone()),
            policy,
            cleanup,
            clock,
            log,
            id: Uuid::new_v4(),
        }
    }

    pub async fn run(self) -> RunResult {
        let started_at = self.clock.now();
        let timer = Instant::now();

        let outcome = self.execute().await;

        let elapsed = timer.elapsed();
        match &outcome {
            Ok(()) => self.log.info(format!(
                "Replication finished. Elapsed time: {:.2} seconds",
                elapsed.as_secs_f64()
            )),
            Err(failure) => self
                .log
                .warn(format!("Replication failed: {}", failure.message)),
        }

        RunResult {
            source: self.context.name().to_string(),
            dest: self.context.root().to_string(),
            started_at,
            elapsed,
            error: outcome.err(),
            log: self.log.contents(),
        }
    }

    async fn execute(&self) -> Result<(), RunFailure> {
        if self.context.lock_exists().await.map_err(exec_failure)? {
            return Err(RunFailure::new(
                FailureKind::AlreadyRunning,
                "replication already running",
            ));
        }

        if !exec::is_reachable(&self.source.root().host).await {
            return Err(RunFailure::new(
                FailureKind::Unreachable,
                format!(
                    "host \"{}\" is not reachable",
                    self.source.root().host
                ),
            ));
        }

        let replicate_version = self
            .source
            .latest_version()
            .await
            .map_err(exec_failure)?
            .ok_or_else(|| {
                RunFailure::new(
                    FailureKind::Other,
                    EngineError::NothingToReplicate.to_string(),
                )
            })?;

        self.log
            .info(format!("Replication started for version {}", replicate_version));

        self.context
            .ensure_destination()
            .await
            .map_err(exec_failure)?;

        let lock_id = format!("remove_lock_{}", self.id);
        self.context.create_lock().await.map_err(exec_failure)?;
        let lock_context = self.context.clone();
        self.cleanup
            .push(&lock_id, move || async move {
                lock_context.remove_lock().await.map_err(EngineError::from)
            })
            .map_err(|e| RunFailure::new(FailureKind::Other, e.to_string()))?;

        let options: Vec<String> = RSYNC_OPTIONS.iter().map(|s| s.to_string()).collect();
        let mut outcome = match fs::rsync(
            replicate_version.path(),
            self.context.root(),
            &options,
        )
        .await
        {
            Ok(stats) => {
                self.log.debug(stats);
                self.context.invalidate();
                Ok(())
            }
            Err(error) => Err(exec_failure(error)),
        };

        if outcome.is_ok() {
            if let Some(policy) = &self.policy {
                if let Err(error) =
                    retention::apply_retention(&self.context, policy, self.clock.now(), &self.log)
                        .await
                {
                    self.log
                        .warn(format!("Failed to apply retention policy: {}", error));
                    outcome = Err(RunFailure::new(FailureKind::Retention, error.to_string()));
                }
            }
        }

        if let Err(error) = self.cleanup.consume(&lock_id).await {
            tracing::warn!(%error, "failed to remove replication lock");
            if outcome.is_ok() {
                outcome = Err(RunFailure::new(FailureKind::Other, error.to_string()));
            }
        }

        outcome
    }
}

#[cfg(test)]
#[path = "replication_tests.rs"]
mod tests;
