// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serde models for the YAML configuration file.
//!
//! Top level: `sources`, `storages`, `jobs`, `notifiers`. Handler and
//! notifier entries are discriminated by their `handler` field; each kind
//! declares its own schema and rejects unknown options.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use usbackup_core::{CronExpr, HostEndpoint, PathRef, RetentionPolicy};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    #[serde(default)]
    pub storages: Vec<StorageSpec>,
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
    #[serde(default)]
    pub notifiers: Vec<NotifierSpec>,
}

impl Config {
    pub fn source(&self, name: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|source| source.name == name)
    }

    pub fn storage(&self, name: &str) -> Option<&StorageSpec> {
        self.storages.iter().find(|storage| storage.name == name)
    }
}

/// A named data producer: a host plus an ordered handler chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    pub name: String,
    /// The producing host; localhost when omitted.
    #[serde(default = "HostEndpoint::localhost")]
    pub host: HostEndpoint,
    #[serde(default)]
    pub handlers: Vec<HandlerSpec>,
}

/// A named destination root path.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSpec {
    pub name: String,
    pub path: PathRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    #[default]
    Backup,
    Replication,
}

impl JobKind {
    pub fn name(self) -> &'static str {
        match self {
            JobKind::Backup => "backup",
            JobKind::Replication => "replication",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationPolicy {
    Never,
    #[default]
    Always,
    OnFailure,
}

/// A scheduled unit of work joining sources to a storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: JobKind,
    pub dest: String,
    /// Replication source storage; required iff `type: replication`.
    #[serde(default)]
    pub replicate: Option<String>,
    #[serde(default)]
    pub limit: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub schedule: CronExpr,
    #[serde(default)]
    pub retention_policy: Option<RetentionPolicy>,
    #[serde(default)]
    pub notification_policy: NotificationPolicy,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default, deserialize_with = "deserialize_argv")]
    pub pre_run_cmd: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_argv")]
    pub post_run_cmd: Vec<String>,
}

fn default_concurrency() -> usize {
    1
}

/// A command line given as a single string, tokenized shell-style.
fn deserialize_argv<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let text = Option::<String>::deserialize(deserializer)?;
    match text {
        None => Ok(Vec::new()),
        Some(text) => {
            shlex::split(&text).ok_or_else(|| D::Error::custom("unbalanced quoting in command"))
        }
    }
}

// ---------------------------------------------------------------------------
// Backup handler specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "handler", rename_all = "snake_case")]
pub enum HandlerSpec {
    Files(FilesSpec),
    Mysql(MysqlSpec),
    Postgresql(PostgresqlSpec),
    Openwrt(OpenwrtSpec),
    Truenas(TruenasSpec),
    Homeassistant(HomeassistantSpec),
    ProxmoxVms(ProxmoxVmsSpec),
    ZfsDatasets(ZfsDatasetsSpec),
    Unifi(UnifiSpec),
}

impl HandlerSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerSpec::Files(_) => "files",
            HandlerSpec::Mysql(_) => "mysql",
            HandlerSpec::Postgresql(_) => "postgresql",
            HandlerSpec::Openwrt(_) => "openwrt",
            HandlerSpec::Truenas(_) => "truenas",
            HandlerSpec::Homeassistant(_) => "homeassistant",
            HandlerSpec::ProxmoxVms(_) => "proxmox_vms",
            HandlerSpec::ZfsDatasets(_) => "zfs_datasets",
            HandlerSpec::Unifi(_) => "unifi",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesMode {
    #[default]
    Incremental,
    Archive,
    Full,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesSpec {
    /// Absolute source paths; the whole filesystem when empty.
    #[serde(default)]
    pub limit: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub bwlimit: Option<u32>,
    #[serde(default)]
    pub mode: FilesMode,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MysqlSpec {
    /// MySQL server endpoints reachable from the source host.
    pub instances: Vec<HostEndpoint>,
    /// Local file holding `user:password` for all instances.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresqlSpec {
    pub instances: Vec<HostEndpoint>,
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenwrtSpec {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TruenasSpec {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HomeassistantSpec {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxmoxMode {
    #[default]
    Snapshot,
    Suspend,
    Stop,
}

impl ProxmoxMode {
    pub fn name(self) -> &'static str {
        match self {
            ProxmoxMode::Snapshot => "snapshot",
            ProxmoxMode::Suspend => "suspend",
            ProxmoxMode::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxmoxCompress {
    #[default]
    Zstd,
    Gzip,
    Lzo,
    None,
}

impl ProxmoxCompress {
    pub fn name(self) -> &'static str {
        match self {
            ProxmoxCompress::Zstd => "zstd",
            ProxmoxCompress::Gzip => "gzip",
            ProxmoxCompress::Lzo => "lzo",
            ProxmoxCompress::None => "none",
        }
    }

    /// File extension of a vzdump archive with this compression.
    pub fn extension(self) -> &'static str {
        match self {
            ProxmoxCompress::Zstd => "vma.zst",
            ProxmoxCompress::Gzip => "vma.gz",
            ProxmoxCompress::Lzo => "vma.lzo",
            ProxmoxCompress::None => "vma",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxmoxVmsSpec {
    #[serde(default)]
    pub limit: Vec<u32>,
    #[serde(default)]
    pub exclude: Vec<u32>,
    #[serde(default)]
    pub bwlimit: Option<u32>,
    #[serde(default)]
    pub mode: ProxmoxMode,
    #[serde(default)]
    pub compress: ProxmoxCompress,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZfsDatasetsSpec {
    #[serde(default)]
    pub limit: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnifiSpec {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Notifier specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "handler", rename_all = "snake_case")]
pub enum NotifierSpec {
    Email(EmailSpec),
    Slack(SlackSpec),
}

impl NotifierSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            NotifierSpec::Email(_) => "email",
            NotifierSpec::Slack(_) => "slack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailSpec {
    pub sender: String,
    pub to: Vec<String>,
    #[serde(default = "default_email_command")]
    pub command: String,
}

fn default_email_command() -> String {
    "sendmail -t".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlackSpec {
    pub token: String,
    pub channel: String,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
