// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Email notifications: an HTML summary piped into a sendmail-style
//! command.

use super::{JobStatus, NotificationHandler};
use crate::error::EngineError;
use crate::exec::Cmd;
use async_trait::async_trait;
use std::time::Duration;
use usbackup_config::{EmailSpec, JobKind};
use usbackup_core::RunResult;

pub struct EmailNotifier {
    spec: EmailSpec,
    job_name: String,
    job_kind: JobKind,
}

impl EmailNotifier {
    pub fn new(spec: EmailSpec, job_name: &str, job_kind: JobKind) -> Self {
        EmailNotifier {
            spec,
            job_name: job_name.to_string(),
            job_kind,
        }
    }

    fn body(&self, status: JobStatus, results: &[RunResult], elapsed: Duration) -> String {
        let mut summary_rows = String::new();
        let mut details = String::new();

        for result in results {
            let status_cell = match &result.error {
                None => "<strong style=\"color:green;\">OK</strong>".to_string(),
                Some(error) => format!(
                    "<strong style=\"color:red;\">Failed</strong> <span>({})</span>",
                    error
                ),
            };

            summary_rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{:.2}s</td><td>{}</td></tr>\n",
                result.source,
                status_cell,
                result.elapsed.as_secs_f64(),
                result.dest
            ));
            details.push_str(&format!(
                "<h4>{}</h4>\n<pre>{}</pre>\n",
                result.source, result.log
            ));
        }

        format!(
            "<html><body>\n\
             <p>{kind} job \"{name}\" finished with status \"{status}\". \
             Total elapsed time: {elapsed:.2}s</p>\n\
             <h3>Summary</h3>\n\
             <table border=\"1\" cellpadding=\"5\" cellspacing=\"0\">\n\
             <thead><tr><th>Source</th><th>Status</th><th>Elapsed</th><th>Destination</th></tr></thead>\n\
             <tbody>\n{rows}</tbody>\n\
             </table>\n\
             <h3>Details</h3>\n{details}\
             </body></html>",
            kind = self.job_kind.name(),
            name = self.job_name,
            status = status,
            elapsed = elapsed.as_secs_f64(),
            rows = summary_rows,
            details = details,
        )
    }

    fn message(&self, status: JobStatus, results: &[RunResult], elapsed: Duration) -> String {
        format!(
            "From: {from}\nTo: {to}\nSubject: {kind} job \"{name}\" status: {status}\n\
             MIME-Version: 1.0\nContent-Type: text/html; charset=UTF-8\n\n{body}",
            from = self.spec.sender,
            to = self.spec.to.join(", "),
            kind = self.job_kind.name(),
            name = self.job_name,
            status = status,
            body = self.body(status, results, elapsed),
        )
    }
}

#[async_trait]
impl NotificationHandler for EmailNotifier {
    fn kind(&self) -> &'static str {
        "email"
    }

    async fn notify(
        &self,
        status: JobStatus,
        results: &[RunResult],
        elapsed: Duration,
    ) -> Result<(), EngineError> {
        let argv = shlex::split(&self.spec.command)
            .ok_or_else(|| EngineError::Handler("unparseable email command".to_string()))?;

        Cmd::new(argv)
            .input(self.message(status, results, elapsed))
            .run()
            .await?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "email_tests.rs"]
mod tests;
