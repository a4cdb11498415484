// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxmox VM backups: stream `vzdump --stdout` per VM into local files.

use super::BackupHandler;
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::runlog::RunLog;
use async_trait::async_trait;
use usbackup_config::ProxmoxVmsSpec;
use usbackup_core::{HostEndpoint, PathRef};

pub struct ProxmoxVmsHandler {
    host: HostEndpoint,
    spec: ProxmoxVmsSpec,
    log: RunLog,
}

impl ProxmoxVmsHandler {
    pub fn new(host: &HostEndpoint, spec: ProxmoxVmsSpec, log: RunLog) -> Self {
        ProxmoxVmsHandler {
            host: host.clone(),
            spec,
            log,
        }
    }

    /// Parse `qm list` output into VM ids, skipping the header line.
    fn parse_vm_ids(output: &str) -> Vec<u32> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| line.split_whitespace().next())
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    fn filter_vms(&self, vms: Vec<u32>) -> Vec<u32> {
        vms.into_iter()
            .filter(|vm| self.spec.limit.is_empty() || self.spec.limit.contains(vm))
            .filter(|vm| !self.spec.exclude.contains(vm))
            .collect()
    }

    async fn backup_vm(&self, vm: u32, dest: &PathRef) -> Result<(), EngineError> {
        let mut argv = vec![
            "vzdump".to_string(),
            vm.to_string(),
            format!("--mode={}", self.spec.mode.name()),
            format!("--compress={}", self.spec.compress.name()),
            "--notification-policy=never".to_string(),
            "--stdout".to_string(),
            "--quiet".to_string(),
        ];
        if let Some(bwlimit) = self.spec.bwlimit {
            argv.push(format!("--bwlimit={}", bwlimit));
        }

        let file = dest.join(&format!(
            "vzdump-qemu-{}.{}",
            vm,
            self.spec.compress.extension()
        ));

        self.log.info(format!(
            "Streaming vzdump for VM {} from \"{}\" to \"{}\"",
            vm, self.host, dest
        ));
        Cmd::new(argv)
            .on(&self.host)
            .stdout_to(&file.path)
            .run()
            .await?;

        Ok(())
    }
}

#[async_trait]
impl BackupHandler for ProxmoxVmsHandler {
    fn kind(&self) -> &'static str {
        "proxmox_vms"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        self.log.info(format!("Fetching VM list from \"{}\"", self.host));
        let output = Cmd::new(["qm", "list"]).on(&self.host).run().await?;

        let vms = self.filter_vms(Self::parse_vm_ids(&output));
        if vms.is_empty() {
            self.log
                .info(format!("No VMs to back up on \"{}\"", self.host));
            return Ok(());
        }

        self.log.info(format!("Backing up VMs {:?}", vms));
        for vm in vms {
            self.backup_vm(vm, dest).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "proxmox_vms_tests.rs"]
mod tests;
