// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ZFS dataset backups: snapshot, `zfs send` into a local file, destroy.
//!
//! The snapshot removal is registered on the cleanup queue before the send
//! starts, so a run cancelled mid-stream still destroys the snapshot at
//! drain.

use super::BackupHandler;
use crate::cleanup::CleanupQueue;
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::runlog::RunLog;
use async_trait::async_trait;
use std::sync::Arc;
use usbackup_config::ZfsDatasetsSpec;
use usbackup_core::{HostEndpoint, PathRef};
use uuid::Uuid;

pub struct ZfsDatasetsHandler {
    host: HostEndpoint,
    spec: ZfsDatasetsSpec,
    cleanup: Arc<CleanupQueue>,
    log: RunLog,
    id: Uuid,
}

impl ZfsDatasetsHandler {
    pub fn new(
        host: &HostEndpoint,
        spec: ZfsDatasetsSpec,
        cleanup: Arc<CleanupQueue>,
        log: RunLog,
    ) -> Self {
        ZfsDatasetsHandler {
            host: host.clone(),
            spec,
            cleanup,
            log,
            id: Uuid::new_v4(),
        }
    }

    fn filter_datasets(&self, datasets: Vec<String>) -> Vec<String> {
        datasets
            .into_iter()
            .filter(|dataset| self.spec.limit.is_empty() || self.spec.limit.contains(dataset))
            .filter(|dataset| !self.spec.exclude.contains(dataset))
            .collect()
    }

    async fn backup_dataset(&self, dataset: &str, dest: &PathRef) -> Result<(), EngineError> {
        let snapshot = format!("{}@backup-{}", dataset, self.id);
        let file = dest.join(&format!("{}.zfs", dataset.replace('/', "_")));

        self.log.info(format!(
            "Creating snapshot \"{}\" on \"{}\"",
            snapshot, self.host
        ));
        Cmd::new(["zfs", "snapshot", snapshot.as_str()])
            .on(&self.host)
            .run()
            .await?;

        let cleanup_id = format!("destroy_snapshot_{}_{}", self.id, dataset.replace('/', "_"));
        let host = self.host.clone();
        let snapshot_for_cleanup = snapshot.clone();
        self.cleanup.push(&cleanup_id, move || async move {
            Cmd::new(["zfs", "destroy", snapshot_for_cleanup.as_str()])
                .on(&host)
                .run()
                .await
                .map(drop)
                .map_err(EngineError::from)
        })?;

        self.log.info(format!(
            "Streaming snapshot \"{}\" from \"{}\" to \"{}\"",
            snapshot, self.host, dest
        ));
        Cmd::new(["zfs", "send", snapshot.as_str()])
            .on(&self.host)
            .stdout_to(&file.path)
            .run()
            .await?;

        self.log.info(format!(
            "Deleting snapshot \"{}\" on \"{}\"",
            snapshot, self.host
        ));
        self.cleanup.consume(&cleanup_id).await?;

        Ok(())
    }
}

#[async_trait]
impl BackupHandler for ZfsDatasetsHandler {
    fn kind(&self) -> &'static str {
        "zfs_datasets"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        self.log
            .info(format!("Fetching datasets from \"{}\"", self.host));
        let output = Cmd::new(["zfs", "list", "-H", "-o", "name"])
            .on(&self.host)
            .run()
            .await?;

        let datasets = self.filter_datasets(
            output
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        );

        if datasets.is_empty() {
            self.log
                .info("No datasets left to backup after limit/exclude filters");
            return Ok(());
        }

        self.log.info(format!("Backing up datasets {:?}", datasets));
        for dataset in &datasets {
            self.backup_dataset(dataset, dest).await?;
        }

        Ok(())
    }
}
