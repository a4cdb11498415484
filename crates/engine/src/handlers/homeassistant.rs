// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Home Assistant backups via the `ha` supervisor CLI.
//!
//! The generated archive lives on the appliance until we have copied it
//! down; its removal goes through the cleanup queue so a cancelled run
//! still deletes it at drain.

use super::BackupHandler;
use crate::cleanup::CleanupQueue;
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::fs;
use crate::runlog::RunLog;
use async_trait::async_trait;
use std::sync::Arc;
use usbackup_core::{HostEndpoint, PathRef};
use uuid::Uuid;

pub struct HomeassistantHandler {
    host: HostEndpoint,
    cleanup: Arc<CleanupQueue>,
    log: RunLog,
    id: Uuid,
}

impl HomeassistantHandler {
    pub fn new(host: &HostEndpoint, cleanup: Arc<CleanupQueue>, log: RunLog) -> Self {
        HomeassistantHandler {
            host: host.clone(),
            cleanup,
            log,
            id: Uuid::new_v4(),
        }
    }
}

#[async_trait]
impl BackupHandler for HomeassistantHandler {
    fn kind(&self) -> &'static str {
        "homeassistant"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        self.log
            .info(format!("Generating backup archive on \"{}\"", self.host));

        let output = Cmd::new([
            "ha",
            "backups",
            "new",
            "--name",
            "usbackup",
            "--raw-json",
            "--no-progress",
        ])
        .on(&self.host)
        .run()
        .await?;

        let result: serde_json::Value = serde_json::from_str(&output)
            .map_err(|e| EngineError::Handler(format!("failed to parse ha output: {e}")))?;

        if result.get("result").and_then(|v| v.as_str()) != Some("ok") {
            return Err(EngineError::Handler(format!(
                "invalid backup result: {result}"
            )));
        }
        let slug = result
            .get("data")
            .and_then(|data| data.get("slug"))
            .and_then(|slug| slug.as_str())
            .ok_or_else(|| EngineError::Handler(format!("invalid backup result: {result}")))?
            .to_string();

        let cleanup_id = format!("remove_ha_backup_{}", self.id);
        let host = self.host.clone();
        let slug_for_cleanup = slug.clone();
        self.cleanup.push(&cleanup_id, move || async move {
            Cmd::new(["ha", "backups", "remove", slug_for_cleanup.as_str()])
                .on(&host)
                .run()
                .await
                .map(drop)
                .map_err(EngineError::from)
        })?;

        self.log
            .info(format!("Copying backup from \"{}\" to \"{}\"", self.host, dest));
        let src = PathRef {
            host: self.host.clone(),
            path: format!("/root/backup/{}.tar", slug),
        };
        fs::scp(&src, &dest.join("backup.tar")).await?;

        self.log
            .info(format!("Deleting backup archive on \"{}\"", self.host));
        self.cleanup.consume(&cleanup_id).await?;

        Ok(())
    }
}
