// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UniFi controller backups via the controller HTTP API.
//!
//! Controllers ship self-signed certificates, so certificate validation is
//! disabled for these requests.

use super::BackupHandler;
use crate::error::EngineError;
use crate::runlog::RunLog;
use async_trait::async_trait;
use usbackup_config::UnifiSpec;
use usbackup_core::{HostEndpoint, PathRef};

const BACKUP_FILE: &str = "unifi_backup.unifi";

pub struct UnifiHandler {
    host: HostEndpoint,
    spec: UnifiSpec,
    log: RunLog,
}

impl UnifiHandler {
    pub fn new(host: &HostEndpoint, spec: UnifiSpec, log: RunLog) -> Self {
        UnifiHandler {
            host: host.clone(),
            spec,
            log,
        }
    }
}

#[async_trait]
impl BackupHandler for UnifiHandler {
    fn kind(&self) -> &'static str {
        "unifi"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .cookie_store(true)
            .build()
            .map_err(|e| EngineError::Handler(format!("http client: {e}")))?;

        self.log.info(format!(
            "Authenticating to Unifi controller at \"{}\"",
            self.host
        ));
        let login = client
            .post(format!("https://{}/api/auth/login", self.host))
            .json(&serde_json::json!({
                "username": self.spec.user,
                "password": self.spec.password,
            }))
            .send()
            .await
            .map_err(|e| EngineError::Handler(format!("login request: {e}")))?;

        if !login.status().is_success() {
            return Err(EngineError::Handler(format!(
                "failed to authenticate to Unifi controller: {}",
                login.status()
            )));
        }

        let csrf_token = login
            .headers()
            .get("X-Csrf-Token")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                EngineError::Handler("CSRF token not found in response headers".to_string())
            })?
            .to_string();

        self.log.info(format!(
            "Getting backup file from Unifi controller at \"{}\"",
            self.host
        ));
        let download = client
            .get(format!("https://{}/api/backup/download", self.host))
            .header("X-Csrf-Token", csrf_token)
            .send()
            .await
            .map_err(|e| EngineError::Handler(format!("download request: {e}")))?;

        if !download.status().is_success() {
            return Err(EngineError::Handler(format!(
                "failed to download backup: {}",
                download.status()
            )));
        }

        let content = download
            .bytes()
            .await
            .map_err(|e| EngineError::Handler(format!("download body: {e}")))?;

        let file = dest.join(BACKUP_FILE);
        tokio::fs::write(&file.path, &content)
            .await
            .map_err(|e| EngineError::Handler(format!("saving backup: {e}")))?;
        self.log.info(format!("Backup saved to \"{}\"", file));

        Ok(())
    }
}
