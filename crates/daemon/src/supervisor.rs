// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level process lifecycle: `Starting → Running → Draining → Exited`.
//!
//! Every exit path — signal, behind-schedule, completed one-shot run —
//! passes through Draining, which drains the cleanup queue so lock files
//! and remote temp artifacts are released even when runners were
//! cancelled mid-flight.

use crate::paths::StatePaths;
use crate::scheduler::{Scheduler, SchedulerError};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use usbackup_config::{Config, JobSpec};
use usbackup_core::{Clock, RunResult, SystemClock};
use usbackup_engine::{CleanupQueue, Datastore, DatastoreError, EngineError, JobCoordinator};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("service is already running (pid file {0} exists)")]
    AlreadyRunning(PathBuf),

    #[error("failed to write pid file {path}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no jobs configured")]
    NoJobs,

    #[error("failed to install signal handler: {0}")]
    Signal(std::io::Error),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    Draining,
    Exited,
}

pub struct Supervisor<C: Clock> {
    config: Config,
    paths: StatePaths,
    cleanup: Arc<CleanupQueue>,
    datastore: Arc<Datastore>,
    clock: C,
    state: Mutex<SupervisorState>,
}

impl Supervisor<SystemClock> {
    pub fn new(config: Config, paths: StatePaths) -> Result<Self, SupervisorError> {
        Supervisor::with_clock(config, paths, SystemClock)
    }
}

impl<C: Clock> Supervisor<C> {
    pub fn with_clock(config: Config, paths: StatePaths, clock: C) -> Result<Self, SupervisorError> {
        let datastore = Arc::new(Datastore::open(&paths.datastore)?);

        Ok(Supervisor {
            config,
            paths,
            cleanup: Arc::new(CleanupQueue::new()),
            datastore,
            clock,
            state: Mutex::new(SupervisorState::Starting),
        })
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock()
    }

    pub fn datastore(&self) -> &Arc<Datastore> {
        &self.datastore
    }

    fn set_state(&self, state: SupervisorState) {
        *self.state.lock() = state;
    }

    fn coordinator(&self, job: JobSpec) -> Arc<JobCoordinator<C>> {
        Arc::new(JobCoordinator::new(
            job,
            &self.config,
            Arc::clone(&self.cleanup),
            Arc::clone(&self.datastore),
            self.clock.clone(),
        ))
    }

    /// Daemon mode: take the PID file, mark the service running and tick
    /// the scheduler until a signal or a fatal drift stops it.
    pub async fn run_daemon(&self) -> Result<(), SupervisorError> {
        self.write_pid_file()?;
        let pid_file = self.paths.pid_file.clone();
        if let Err(error) = self.cleanup.push("remove_pid", move || async move {
            tokio::fs::remove_file(&pid_file)
                .await
                .map_err(|e| EngineError::Handler(format!("removing pid file: {e}")))
        }) {
            tracing::warn!(%error, "failed to register pid file cleanup");
        }

        self.datastore.set("running", &true)?;
        let datastore = Arc::clone(&self.datastore);
        if let Err(error) = self.cleanup.push("mark_not_running", move || async move {
            datastore
                .set("running", &false)
                .map_err(|e| EngineError::Handler(format!("marking not running: {e}")))
        }) {
            tracing::warn!(%error, "failed to register running-flag cleanup");
        }

        let mut sigterm = signal(SignalKind::terminate()).map_err(SupervisorError::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(SupervisorError::Signal)?;
        let mut sigquit = signal(SignalKind::quit()).map_err(SupervisorError::Signal)?;

        let coordinators = self
            .config
            .jobs
            .iter()
            .map(|job| self.coordinator(job.clone()))
            .collect();
        let scheduler = Scheduler::new(coordinators, Arc::clone(&self.datastore), self.clock.clone());

        let shutdown = CancellationToken::new();
        let mut scheduler_task = tokio::spawn(scheduler.run(shutdown.clone()));

        self.set_state(SupervisorState::Running);
        tracing::info!("Starting service");

        let result = tokio::select! {
            // the scheduler stopped on its own: behind schedule
            outcome = &mut scheduler_task => {
                match outcome {
                    Ok(result) => result.map_err(SupervisorError::from),
                    Err(join_error) => {
                        tracing::error!(%join_error, "scheduler task failed");
                        Ok(())
                    }
                }
            }
            _ = sigterm.recv() => { tracing::info!("received SIGTERM"); Ok(()) }
            _ = sigint.recv() => { tracing::info!("received SIGINT"); Ok(()) }
            _ = sigquit.recv() => { tracing::info!("received SIGQUIT"); Ok(()) }
        };

        // Draining: stop the loop after its current tick, await outstanding
        // runners, then release everything still registered.
        self.set_state(SupervisorState::Draining);
        tracing::info!("Shutting down service");

        shutdown.cancel();
        if !scheduler_task.is_finished() {
            if let Err(join_error) = scheduler_task.await {
                tracing::error!(%join_error, "scheduler task failed during shutdown");
            }
        }

        self.cleanup.drain().await;
        self.set_state(SupervisorState::Exited);

        result
    }

    /// Once mode: run a single job to completion and drain.
    ///
    /// Without an explicit job the first configured one runs.
    pub async fn run_once(
        &self,
        job: Option<JobSpec>,
    ) -> Result<Vec<RunResult>, SupervisorError> {
        let job = match job {
            Some(job) => job,
            None => self
                .config
                .jobs
                .first()
                .cloned()
                .ok_or(SupervisorError::NoJobs)?,
        };

        self.set_state(SupervisorState::Running);
        let coordinator = self.coordinator(job);
        let outcome = coordinator.run().await;

        let stamp = self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string();
        if let Err(error) = self.datastore.set("last_manual_run", &stamp) {
            tracing::warn!(%error, "failed to record last manual run");
        }

        self.set_state(SupervisorState::Draining);
        self.cleanup.drain().await;
        self.set_state(SupervisorState::Exited);

        Ok(outcome?)
    }

    fn write_pid_file(&self) -> Result<(), SupervisorError> {
        if self.paths.pid_file.exists() {
            return Err(SupervisorError::AlreadyRunning(self.paths.pid_file.clone()));
        }

        if let Some(parent) = self.paths.pid_file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SupervisorError::PidFile {
                path: self.paths.pid_file.clone(),
                source,
            })?;
        }
        std::fs::write(&self.paths.pid_file, format!("{}\n", std::process::id())).map_err(
            |source| SupervisorError::PidFile {
                path: self.paths.pid_file.clone(),
                source,
            },
        )
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
