// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-source backup workflow.
//!
//! Lock, probe, mint a version, drive the handler chain, apply retention.
//! The rollback entry is pushed before the handler loop so every exit path
//! (including cancellation followed by a queue drain) removes a partial
//! version; it is popped, not run, once the version is canonical.

use super::exec_failure;
use crate::cleanup::CleanupQueue;
use crate::context::BackupContext;
use crate::error::EngineError;
use crate::exec;
use crate::fs;
use crate::handlers::{self, BackupHandler};
use crate::retention;
use crate::runlog::RunLog;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Instant;
use usbackup_config::SourceSpec;
use usbackup_core::{
    Clock, FailureKind, HostEndpoint, PathRef, RetentionPolicy, RunFailure, RunResult, Version,
};
use uuid::Uuid;

pub struct BackupRunner<C: Clock> {
    context: BackupContext,
    host: HostEndpoint,
    handlers: Vec<Box<dyn BackupHandler>>,
    policy: Option<RetentionPolicy>,
    cleanup: Arc<CleanupQueue>,
    clock: C,
    log: RunLog,
    id: Uuid,
}

impl<C: Clock> BackupRunner<C> {
    /// Build a runner for a configured source, instantiating its handler
    /// chain.
    pub fn new(
        source: &SourceSpec,
        storage_root: &PathRef,
        policy: Option<RetentionPolicy>,
        cleanup: Arc<CleanupQueue>,
        clock: C,
    ) -> Self {
        let log = RunLog::new();
        let context = BackupContext::new(&source.name, storage_root, log.clone());
        let handlers = handlers::build_all(source, &cleanup, &log);

        BackupRunner {
            context,
            host: source.host.clone(),
            handlers,
            policy,
            cleanup,
            clock,
            log,
            id: Uuid::new_v4(),
        }
    }

    /// Build a runner around explicit handlers (tests).
    pub fn with_handlers(
        context: BackupContext,
        host: HostEndpoint,
        handlers: Vec<Box<dyn BackupHandler>>,
        policy: Option<RetentionPolicy>,
        cleanup: Arc<CleanupQueue>,
        clock: C,
        log: RunLog,
    ) -> Self {
        BackupRunner {
            context,
            host,
            handlers,
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

        let outcome = self.execute(started_at).await;

        let elapsed = timer.elapsed();
        match &outcome {
            Ok(()) => self.log.info(format!(
                "Backup finished. Elapsed time: {:.2} seconds",
                elapsed.as_secs_f64()
            )),
            Err(failure) => self.log.warn(format!("Backup failed: {}", failure.message)),
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

    async fn execute(&self, started_at: NaiveDateTime) -> Result<(), RunFailure> {
        if self.context.lock_exists().await.map_err(exec_failure)? {
            return Err(RunFailure::new(
                FailureKind::AlreadyRunning,
                "backup already running",
            ));
        }

        if !exec::is_reachable(&self.host).await {
            return Err(RunFailure::new(
                FailureKind::Unreachable,
                format!("host \"{}\" is not reachable", self.host),
            ));
        }

        self.log.info(format!("Backup started at {}", started_at));

        self.context
            .ensure_destination()
            .await
            .map_err(exec_failure)?;

        let previous = self.context.latest_version().await.map_err(exec_failure)?;
        let version = self
            .context
            .generate_version(started_at)
            .await
            .map_err(EngineError::into_failure)?;

        let lock_id = format!("remove_lock_{}", self.id);
        self.context.create_lock().await.map_err(exec_failure)?;
        let lock_context = self.context.clone();
        self.cleanup
            .push(&lock_id, move || async move {
                lock_context.remove_lock().await.map_err(EngineError::from)
            })
            .map_err(|e| RunFailure::new(FailureKind::Other, e.to_string()))?;

        let rollback_id = format!("rollback_version_{}", self.id);
        let rollback_context = self.context.clone();
        let rollback_version = version.clone();
        self.cleanup
            .push(&rollback_id, move || async move {
                rollback_context
                    .remove_version(&rollback_version)
                    .await
                    .map_err(EngineError::from)
            })
            .map_err(|e| RunFailure::new(FailureKind::Other, e.to_string()))?;

        let mut outcome = self.run_handlers(&version, previous.as_ref()).await;

        match &outcome {
            Ok(()) => {
                // the version is canonical now; discard the rollback entry
                if let Err(error) = self.cleanup.pop(&rollback_id) {
                    tracing::warn!(%error, "failed to discard rollback entry");
                }

                if let Some(policy) = &self.policy {
                    if let Err(error) = retention::apply_retention(
                        &self.context,
                        policy,
                        self.clock.now(),
                        &self.log,
                    )
                    .await
                    {
                        self.log
                            .warn(format!("Failed to apply retention policy: {}", error));
                        outcome = Err(RunFailure::new(FailureKind::Retention, error.to_string()));
                    }
                }
            }
            Err(_) => {
                self.log.warn("Deleting inconsistent backup version");
                if let Err(error) = self.cleanup.consume(&rollback_id).await {
                    tracing::warn!(%error, "failed to roll back partial version");
                }
            }
        }

        if let Err(error) = self.cleanup.consume(&lock_id).await {
            tracing::warn!(%error, "failed to remove backup lock");
            if outcome.is_ok() {
                outcome = Err(RunFailure::new(FailureKind::Other, error.to_string()));
            }
        }

        outcome
    }

    /// Drive the handler chain in order. Handler N sees the side effects
    /// of handler N-1; the first failure stops the chain.
    async fn run_handlers(
        &self,
        version: &Version,
        previous: Option<&Version>,
    ) -> Result<(), RunFailure> {
        for handler in &self.handlers {
            let dest = version.path().join(handler.kind());
            let link_dest = previous.map(|prev| prev.path().join(handler.kind()));

            if let Some(prev) = previous {
                self.log.info(format!(
                    "Using \"{}\" as dest link for \"{}\" handler",
                    prev.path(),
                    handler.kind()
                ));
            }

            self.log
                .info(format!("Creating handler directory \"{}\"", dest));
            fs::mkdir_p(&dest).await.map_err(|e| {
                RunFailure::new(FailureKind::Handler, format!("handler directory: {}", e))
            })?;

            self.log
                .info(format!("Performing backup via \"{}\" handler", handler.kind()));
            handler
                .backup(&dest, link_dest.as_ref())
                .await
                .map_err(|e| {
                    RunFailure::new(
                        FailureKind::Handler,
                        format!("handler \"{}\" failed: {}", handler.kind(), e),
                    )
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
