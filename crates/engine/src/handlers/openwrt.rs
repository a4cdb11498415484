// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenWrt config backups via `sysupgrade -b`.

use super::BackupHandler;
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::fs;
use crate::runlog::RunLog;
use async_trait::async_trait;
use usbackup_core::{HostEndpoint, PathRef};

const REMOTE_ARCHIVE: &str = "/tmp/backup-openwrt.tar.gz";

pub struct OpenwrtHandler {
    host: HostEndpoint,
    log: RunLog,
}

impl OpenwrtHandler {
    pub fn new(host: &HostEndpoint, log: RunLog) -> Self {
        OpenwrtHandler {
            host: host.clone(),
            log,
        }
    }
}

#[async_trait]
impl BackupHandler for OpenwrtHandler {
    fn kind(&self) -> &'static str {
        "openwrt"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        self.log.info(format!(
            "Generating backup archive \"{}\" on \"{}\"",
            REMOTE_ARCHIVE, self.host
        ));
        Cmd::new(["sysupgrade", "-b", REMOTE_ARCHIVE])
            .on(&self.host)
            .run()
            .await?;

        self.log
            .info(format!("Copying backup from \"{}\" to \"{}\"", self.host, dest));
        let src = PathRef {
            host: self.host.clone(),
            path: REMOTE_ARCHIVE.to_string(),
        };
        fs::rsync(&src, dest, &["--remove-source-files".to_string()]).await?;

        Ok(())
    }
}
