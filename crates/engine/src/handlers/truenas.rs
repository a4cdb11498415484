// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TrueNAS config backups: the config database plus the secret seed.

use super::BackupHandler;
use crate::error::EngineError;
use crate::fs;
use crate::runlog::RunLog;
use async_trait::async_trait;
use usbackup_core::{HostEndpoint, PathRef};

const CONFIG_FILES: [&str; 2] = ["/data/freenas-v1.db", "/data/pwenc_secret"];

pub struct TruenasHandler {
    host: HostEndpoint,
    log: RunLog,
}

impl TruenasHandler {
    pub fn new(host: &HostEndpoint, log: RunLog) -> Self {
        TruenasHandler {
            host: host.clone(),
            log,
        }
    }
}

#[async_trait]
impl BackupHandler for TruenasHandler {
    fn kind(&self) -> &'static str {
        "truenas"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        self.log
            .info(format!("Copying config files from \"{}\" to \"{}\"", self.host, dest));

        for file in CONFIG_FILES {
            let src = PathRef {
                host: self.host.clone(),
                path: file.to_string(),
            };
            fs::rsync(&src, dest, &[]).await?;
        }

        Ok(())
    }
}
