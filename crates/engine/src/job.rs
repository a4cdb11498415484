// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job coordination: pre/post commands, source fan-out, result collection,
//! notification and state persistence for one configured job.

use crate::cleanup::CleanupQueue;
use crate::datastore::{BackupsMap, Datastore, BACKUPS_KEY};
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::notify::Notifier;
use crate::runner::{BackupRunner, ReplicationRunner};
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use usbackup_config::{Config, JobKind, JobSpec, SourceSpec, StorageSpec};
use usbackup_core::{BackupRecord, Clock, FailureKind, RunFailure, RunResult};

pub struct JobCoordinator<C: Clock> {
    job: JobSpec,
    sources: Vec<SourceSpec>,
    storages: Vec<StorageSpec>,
    notifier: Notifier,
    cleanup: Arc<CleanupQueue>,
    datastore: Arc<Datastore>,
    clock: C,
}

impl<C: Clock> JobCoordinator<C> {
    pub fn new(
        job: JobSpec,
        config: &Config,
        cleanup: Arc<CleanupQueue>,
        datastore: Arc<Datastore>,
        clock: C,
    ) -> Self {
        let notifier = Notifier::new(
            &job.name,
            job.kind,
            job.notification_policy,
            &config.notifiers,
        );

        JobCoordinator {
            sources: config.sources.clone(),
            storages: config.storages.clone(),
            job,
            notifier,
            cleanup,
            datastore,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.job.name
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.job.schedule.matches(now)
    }

    /// Run the job to completion and return one result per source.
    ///
    /// Runner failures are captured into results; only pre-run-command
    /// failures and unresolvable configuration abort the job itself.
    pub async fn run(&self) -> Result<Vec<RunResult>, EngineError> {
        tracing::info!(job = %self.job.name, kind = self.job.kind.name(), "Job started");
        let timer = Instant::now();

        if !self.job.pre_run_cmd.is_empty() {
            tracing::info!(job = %self.job.name, "Running pre run command");
            Cmd::new(self.job.pre_run_cmd.clone()).run().await?;
        }

        let sources = self.select_sources()?;
        let dest = self.storage(&self.job.dest)?.clone();
        let replicate = match self.job.kind {
            JobKind::Backup => None,
            JobKind::Replication => Some(
                self.storage(self.job.replicate.as_deref().unwrap_or_default())?
                    .clone(),
            ),
        };

        let results = self.fan_out(sources, dest, replicate).await;

        if !self.job.post_run_cmd.is_empty() {
            tracing::info!(job = %self.job.name, "Running post run command");
            if let Err(error) = Cmd::new(self.job.post_run_cmd.clone()).run().await {
                tracing::error!(job = %self.job.name, %error, "Post run command failed");
            }
        }

        let elapsed = timer.elapsed();
        tracing::info!(
            job = %self.job.name,
            elapsed_secs = elapsed.as_secs_f64(),
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            "Job finished"
        );

        self.notifier.notify(&results, elapsed).await;

        if self.job.kind == JobKind::Backup {
            self.persist_results(&results);
        }

        Ok(results)
    }

    /// Launch one runner task per source under the concurrency semaphore.
    /// Tasks are isolated: a panic in one becomes a failed result, never a
    /// cancellation of its peers.
    async fn fan_out(
        &self,
        sources: Vec<SourceSpec>,
        dest: StorageSpec,
        replicate: Option<StorageSpec>,
    ) -> Vec<RunResult> {
        let semaphore = Arc::new(Semaphore::new(self.job.concurrency));
        let mut handles = Vec::new();

        for source in sources {
            let semaphore = Arc::clone(&semaphore);
            let cleanup = Arc::clone(&self.cleanup);
            let clock = self.clock.clone();
            let policy = self.job.retention_policy.clone();
            let kind = self.job.kind;
            let dest = dest.clone();
            let replicate = replicate.clone();
            let name = source.name.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return RunResult::failed(
                            &source.name,
                            clock.now(),
                            RunFailure::new(FailureKind::Other, "semaphore closed"),
                        )
                    }
                };

                tracing::info!(source = %source.name, "Running {} for source", kind.name());
                match (kind, replicate) {
                    (JobKind::Replication, Some(replicate)) => ReplicationRunner::new(
                        &source.name,
                        &dest.path,
                        &replicate.path,
                        policy,
                        cleanup,
                        clock,
                    )
                    .run()
                    .await,
                    _ => BackupRunner::new(&source, &dest.path, policy, cleanup, clock)
                        .run()
                        .await,
                }
            });

            handles.push((name, handle));
        }

        let mut results = Vec::new();
        for (name, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(error) => {
                    tracing::error!(source = %name, %error, "Runner task failed");
                    results.push(RunResult::failed(
                        &name,
                        self.clock.now(),
                        RunFailure::new(FailureKind::Other, format!("runner task failed: {error}")),
                    ));
                }
            }
        }
        results
    }

    /// Apply the job's `limit` whitelist then `exclude` blacklist. An
    /// empty selection is a hard failure.
    fn select_sources(&self) -> Result<Vec<SourceSpec>, EngineError> {
        let selected: Vec<SourceSpec> = self
            .sources
            .iter()
            .filter(|source| self.job.limit.is_empty() || self.job.limit.contains(&source.name))
            .filter(|source| !self.job.exclude.contains(&source.name))
            .cloned()
            .collect();

        if selected.is_empty() {
            return Err(EngineError::NoSources(self.job.name.clone()));
        }
        Ok(selected)
    }

    fn storage(&self, name: &str) -> Result<&StorageSpec, EngineError> {
        self.storages
            .iter()
            .find(|storage| storage.name == name)
            .ok_or_else(|| EngineError::UnknownStorage(name.to_string()))
    }

    /// Record the latest outcome per source under `backups` for the stats
    /// surface. Persistence failures degrade reporting only.
    fn persist_results(&self, results: &[RunResult]) {
        let mut backups: BackupsMap = self.datastore.get(BACKUPS_KEY).unwrap_or_default();
        for result in results {
            backups.insert(result.source.clone(), BackupRecord::from(result));
        }
        if let Err(error) = self.datastore.set(BACKUPS_KEY, &backups) {
            tracing::warn!(%error, "Failed to persist backup records");
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
