// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minute-aligned job scheduler.
//!
//! The loop wakes at the top of every minute, asks each coordinator
//! whether it is due and launches due jobs fire-and-forget. Two different
//! jobs may overlap (with a warning); a job overlapping itself is fenced
//! per source by `backup.lock`, not here. Falling behind a full tick is
//! fatal: the loop exits and the supervisor drains.

use chrono::{NaiveDateTime, Timelike};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use usbackup_core::Clock;
use usbackup_engine::{Datastore, JobCoordinator};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is {minutes} minute(s) behind schedule")]
    BehindSchedule { minutes: i64 },
}

/// Truncate a time to its minute (seconds and below zeroed).
fn truncate_to_minute(time: NaiveDateTime) -> NaiveDateTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// The sleep until `next_tick`, or the drift when the tick already
/// passed.
fn time_until(next_tick: NaiveDateTime, now: NaiveDateTime) -> Result<Duration, SchedulerError> {
    let delta = next_tick - now;
    match delta.to_std() {
        Ok(duration) => Ok(duration),
        Err(_) => {
            let behind = now - next_tick;
            Err(SchedulerError::BehindSchedule {
                // round the drift up to whole minutes
                minutes: (behind.num_seconds() + 59) / 60,
            })
        }
    }
}

pub struct Scheduler<C: Clock> {
    coordinators: Vec<Arc<JobCoordinator<C>>>,
    datastore: Arc<Datastore>,
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(
        coordinators: Vec<Arc<JobCoordinator<C>>>,
        datastore: Arc<Datastore>,
        clock: C,
    ) -> Self {
        Scheduler {
            coordinators,
            datastore,
            clock,
        }
    }

    /// The coordinators due at `now`.
    fn due_jobs(&self, now: NaiveDateTime) -> Vec<Arc<JobCoordinator<C>>> {
        self.coordinators
            .iter()
            .filter(|coordinator| coordinator.is_due(now))
            .cloned()
            .collect()
    }

    /// Run the scheduler loop until cancellation or a fatal drift.
    ///
    /// Outstanding job tasks are aborted and awaited before this returns,
    /// so the caller can drain the cleanup queue immediately after.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), SchedulerError> {
        let mut jobs: JoinSet<()> = JoinSet::new();
        let mut prior_tick = truncate_to_minute(self.clock.now());

        let result = loop {
            let next_tick = prior_tick + chrono::Duration::minutes(1);

            let now = self.clock.now();
            let due = self.due_jobs(now);
            if due.len() > 1 {
                tracing::warn!(count = due.len(), "launching multiple jobs concurrently");
            }
            if !due.is_empty() {
                let stamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
                if let Err(error) = self.datastore.set("last_scheduled_run", &stamp) {
                    tracing::warn!(%error, "failed to record last scheduled run");
                }
            }
            for coordinator in due {
                tracing::info!(job = %coordinator.name(), "launching scheduled job");
                jobs.spawn(async move {
                    if let Err(error) = coordinator.run().await {
                        tracing::error!(job = %coordinator.name(), %error, "job failed");
                    }
                });
            }

            // reap finished job tasks without blocking
            while jobs.try_join_next().is_some() {}

            let sleep = match time_until(next_tick, self.clock.now()) {
                Ok(duration) => duration,
                Err(error) => {
                    tracing::error!(%error, "scheduler cannot keep up; shutting down");
                    break Err(error);
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep) => {}
                _ = shutdown.cancelled() => break Ok(()),
            }

            prior_tick = next_tick;
        };

        // cancel outstanding runners and await them so locks are released
        // through their cleanup entries at the supervisor's drain
        jobs.shutdown().await;

        result
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
