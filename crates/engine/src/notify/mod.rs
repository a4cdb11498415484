// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job notifications.
//!
//! The [`Notifier`] enforces the job's notification policy and dispatches
//! to the configured transports. Individual transport failures are logged,
//! never propagated: reporting must not fail a job.

mod email;
mod slack;

pub use email::EmailNotifier;
pub use slack::SlackNotifier;

use crate::error::EngineError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use usbackup_config::{JobKind, NotificationPolicy, NotifierSpec};
use usbackup_core::RunResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Ok,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Ok => write!(f, "ok"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A notification transport. Constructed per job with the job's name and
/// kind so messages can identify their origin.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn notify(
        &self,
        status: JobStatus,
        results: &[RunResult],
        elapsed: Duration,
    ) -> Result<(), EngineError>;
}

pub struct Notifier {
    policy: NotificationPolicy,
    handlers: Vec<Box<dyn NotificationHandler>>,
}

impl Notifier {
    pub fn new(
        job_name: &str,
        job_kind: JobKind,
        policy: NotificationPolicy,
        specs: &[NotifierSpec],
    ) -> Self {
        let handlers = specs
            .iter()
            .map(|spec| -> Box<dyn NotificationHandler> {
                match spec {
                    NotifierSpec::Email(spec) => {
                        Box::new(EmailNotifier::new(spec.clone(), job_name, job_kind))
                    }
                    NotifierSpec::Slack(spec) => {
                        Box::new(SlackNotifier::new(spec.clone(), job_name, job_kind))
                    }
                }
            })
            .collect();

        Notifier { policy, handlers }
    }

    /// A notifier with explicit handlers, bypassing the config mapping.
    pub fn with_handlers(
        policy: NotificationPolicy,
        handlers: Vec<Box<dyn NotificationHandler>>,
    ) -> Self {
        Notifier { policy, handlers }
    }

    /// Emit notifications for a finished job, subject to the policy.
    pub async fn notify(&self, results: &[RunResult], elapsed: Duration) {
        let failed = results.iter().any(|result| !result.is_ok());
        let status = if failed { JobStatus::Failed } else { JobStatus::Ok };

        match self.policy {
            NotificationPolicy::Never => return,
            NotificationPolicy::OnFailure if !failed => return,
            _ => {}
        }

        if self.handlers.is_empty() {
            tracing::warn!("No notification handlers configured");
            return;
        }

        for handler in &self.handlers {
            tracing::info!(kind = handler.kind(), "Sending notification");
            if let Err(error) = handler.notify(status, results, elapsed).await {
                tracing::error!(
                    kind = handler.kind(),
                    %error,
                    "Failed to send notification"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
