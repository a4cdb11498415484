// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `usbackup run`: one-shot job synthesized from command-line overrides.

use crate::exit_error::ExitError;
use clap::Args;
use std::path::Path;
use usbackup_config::{JobKind, JobSpec, NotificationPolicy};
use usbackup_core::RetentionPolicy;
use usbackup_daemon::{StatePaths, Supervisor};

#[derive(Args)]
pub struct RunArgs {
    /// Destination storage to be used when performing the job
    #[arg(long)]
    pub dest: String,

    /// The type of the job to run
    #[arg(long = "type", value_enum, default_value = "backup")]
    pub kind: JobKindArg,

    /// Source storage to read the data from when performing a replication
    /// job; required when the job type is replication, otherwise ignored
    #[arg(long)]
    pub replicate: Option<String>,

    /// Limit the job to the given sources (repeatable)
    #[arg(long)]
    pub limit: Vec<String>,

    /// Sources to exclude from the job (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Retention policy, e.g. last=6,hourly=24,daily=7,weekly=4,monthly=12,yearly=1
    #[arg(long)]
    pub retention_policy: Option<String>,

    /// Notification policy
    #[arg(long, value_enum)]
    pub notification_policy: Option<NotificationPolicyArg>,

    /// Number of sources to back up concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum JobKindArg {
    Backup,
    Replication,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum NotificationPolicyArg {
    Never,
    Always,
    #[value(name = "on-failure")]
    OnFailure,
}

impl RunArgs {
    /// The synthesized one-shot job, named `manual-<YYYYMMDDHHMMSS>`.
    fn into_job(self, now: chrono::NaiveDateTime) -> Result<JobSpec, ExitError> {
        let kind = match self.kind {
            JobKindArg::Backup => JobKind::Backup,
            JobKindArg::Replication => JobKind::Replication,
        };

        if kind == JobKind::Replication && self.replicate.is_none() {
            return Err(ExitError::config(
                "replication jobs require --replicate <storage>",
            ));
        }

        let retention_policy = self
            .retention_policy
            .as_deref()
            .map(RetentionPolicy::parse_spec)
            .transpose()
            .map_err(ExitError::config)?;

        Ok(JobSpec {
            name: format!("manual-{}", now.format("%Y%m%d%H%M%S")),
            kind,
            dest: self.dest,
            replicate: match kind {
                JobKind::Replication => self.replicate,
                JobKind::Backup => None,
            },
            limit: self.limit,
            exclude: self.exclude,
            schedule: Default::default(),
            retention_policy,
            notification_policy: match self.notification_policy {
                Some(NotificationPolicyArg::Never) => NotificationPolicy::Never,
                Some(NotificationPolicyArg::Always) => NotificationPolicy::Always,
                Some(NotificationPolicyArg::OnFailure) => NotificationPolicy::OnFailure,
                None => NotificationPolicy::default(),
            },
            concurrency: self.concurrency.unwrap_or(1).max(1),
            pre_run_cmd: Vec::new(),
            post_run_cmd: Vec::new(),
        })
    }
}

pub async fn run(config_path: Option<&Path>, args: RunArgs) -> Result<(), ExitError> {
    let config = usbackup_config::load(config_path).map_err(ExitError::config)?;

    let job = args.into_job(chrono::Local::now().naive_local())?;
    tracing::info!(job = %job.name, "running one-shot job");

    let supervisor =
        Supervisor::new(config, StatePaths::system()).map_err(ExitError::failure)?;
    let results = supervisor
        .run_once(Some(job))
        .await
        .map_err(ExitError::failure)?;

    for result in &results {
        match &result.error {
            None => println!("{}: OK ({:.2}s)", result.source, result.elapsed.as_secs_f64()),
            Some(error) => println!("{}: FAILED ({})", result.source, error.message),
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
