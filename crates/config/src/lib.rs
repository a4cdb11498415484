// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! usbackup-config: YAML configuration models, validation and discovery.

mod model;
mod validate;

pub use model::{
    Config, EmailSpec, FilesMode, FilesSpec, HandlerSpec, HomeassistantSpec, JobKind, JobSpec,
    MysqlSpec, NotificationPolicy, NotifierSpec, OpenwrtSpec, PostgresqlSpec, ProxmoxCompress,
    ProxmoxMode, ProxmoxVmsSpec, SlackSpec, SourceSpec, StorageSpec, TruenasSpec, UnifiSpec,
    ZfsDatasetsSpec,
};
pub use validate::validate;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config file found (tried: {0})")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

/// Default locations probed when `--config` is not given, in order.
fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/etc/usbackup/config.yml"),
        PathBuf::from("/etc/opt/usbackup/config.yml"),
    ];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/usbackup/config.yml"));
    }
    paths
}

/// Load and validate the configuration from an explicit path or the first
/// existing default location.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_paths()
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                let tried: Vec<String> = default_paths()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                ConfigError::NotFound(tried.join(", "))
            })?,
    };

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    parse(&text)
}

/// Parse and validate a configuration document.
pub fn parse(text: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}
