// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup handlers: subprocess/HTTP glue producing artifacts into a
//! version's per-kind subdirectory.
//!
//! Handlers are selected by the `handler` tag in the source configuration;
//! [`build`] maps each spec variant to its implementation.

mod files;
mod homeassistant;
mod mysql;
mod openwrt;
mod postgresql;
mod proxmox_vms;
mod truenas;
mod unifi;
mod zfs_datasets;

pub use files::FilesHandler;
pub use homeassistant::HomeassistantHandler;
pub use mysql::MysqlHandler;
pub use openwrt::OpenwrtHandler;
pub use postgresql::PostgresqlHandler;
pub use proxmox_vms::ProxmoxVmsHandler;
pub use truenas::TruenasHandler;
pub use unifi::UnifiHandler;
pub use zfs_datasets::ZfsDatasetsHandler;

use crate::cleanup::CleanupQueue;
use crate::error::EngineError;
use crate::runlog::RunLog;
use async_trait::async_trait;
use std::sync::Arc;
use usbackup_config::{HandlerSpec, SourceSpec};
use usbackup_core::{HostEndpoint, PathRef};

/// A pluggable producer of backup artifacts.
///
/// `dest` is a pre-created empty directory owned by the current version;
/// `link_dest` points at the same handler's subdirectory in the previous
/// version, when one exists.
#[async_trait]
pub trait BackupHandler: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn backup(&self, dest: &PathRef, link_dest: Option<&PathRef>)
        -> Result<(), EngineError>;
}

/// Instantiate the handler for one spec.
pub fn build(
    spec: &HandlerSpec,
    host: &HostEndpoint,
    cleanup: &Arc<CleanupQueue>,
    log: &RunLog,
) -> Box<dyn BackupHandler> {
    match spec {
        HandlerSpec::Files(spec) => Box::new(FilesHandler::new(host, spec.clone(), log.clone())),
        HandlerSpec::Mysql(spec) => Box::new(MysqlHandler::new(
            host,
            spec.clone(),
            Arc::clone(cleanup),
            log.clone(),
        )),
        HandlerSpec::Postgresql(spec) => {
            Box::new(PostgresqlHandler::new(host, spec.clone(), log.clone()))
        }
        HandlerSpec::Openwrt(_) => Box::new(OpenwrtHandler::new(host, log.clone())),
        HandlerSpec::Truenas(_) => Box::new(TruenasHandler::new(host, log.clone())),
        HandlerSpec::Homeassistant(_) => Box::new(HomeassistantHandler::new(
            host,
            Arc::clone(cleanup),
            log.clone(),
        )),
        HandlerSpec::ProxmoxVms(spec) => {
            Box::new(ProxmoxVmsHandler::new(host, spec.clone(), log.clone()))
        }
        HandlerSpec::ZfsDatasets(spec) => Box::new(ZfsDatasetsHandler::new(
            host,
            spec.clone(),
            Arc::clone(cleanup),
            log.clone(),
        )),
        HandlerSpec::Unifi(spec) => Box::new(UnifiHandler::new(host, spec.clone(), log.clone())),
    }
}

/// Instantiate a source's whole handler chain, in configuration order.
pub fn build_all(
    source: &SourceSpec,
    cleanup: &Arc<CleanupQueue>,
    log: &RunLog,
) -> Vec<Box<dyn BackupHandler>> {
    source
        .handlers
        .iter()
        .map(|spec| build(spec, &source.host, cleanup, log))
        .collect()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
