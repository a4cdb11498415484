// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slack notifications: the concatenated run logs uploaded as a file with
//! a status comment.

use super::{JobStatus, NotificationHandler};
use crate::error::EngineError;
use async_trait::async_trait;
use std::time::Duration;
use usbackup_config::{JobKind, SlackSpec};
use usbackup_core::RunResult;

const UPLOAD_URL: &str = "https://slack.com/api/files.upload";

pub struct SlackNotifier {
    spec: SlackSpec,
    job_name: String,
    job_kind: JobKind,
}

impl SlackNotifier {
    pub fn new(spec: SlackSpec, job_name: &str, job_kind: JobKind) -> Self {
        SlackNotifier {
            spec,
            job_name: job_name.to_string(),
            job_kind,
        }
    }
}

#[async_trait]
impl NotificationHandler for SlackNotifier {
    fn kind(&self) -> &'static str {
        "slack"
    }

    async fn notify(
        &self,
        status: JobStatus,
        results: &[RunResult],
        _elapsed: Duration,
    ) -> Result<(), EngineError> {
        let details: Vec<&str> = results
            .iter()
            .map(|result| result.log.as_str())
            .filter(|log| !log.is_empty())
            .collect();

        let form = reqwest::multipart::Form::new()
            .text("channels", self.spec.channel.clone())
            .text(
                "initial_comment",
                format!(
                    "*{} job \"{}\" status: {}*",
                    self.job_kind.name(),
                    self.job_name,
                    status
                ),
            )
            .part(
                "file",
                reqwest::multipart::Part::text(details.join("\n")).file_name("report.log"),
            );

        let response = reqwest::Client::new()
            .post(UPLOAD_URL)
            .bearer_auth(&self.spec.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EngineError::Handler(format!("slack request: {e}")))?;

        let code = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EngineError::Handler(format!("slack response: {e}")))?;

        if !code.is_success() || body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            return Err(EngineError::Handler(format!(
                "slack exception: code: {code}, response: {body}"
            )));
        }

        Ok(())
    }
}
