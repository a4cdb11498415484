// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PostgreSQL dumps: `pg_dumpall` per configured instance.
//!
//! Dumps run locally and connect to the instances over TCP; credentials
//! come from a PGPASSFILE or the instance's inline password.

use super::BackupHandler;
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::runlog::RunLog;
use async_trait::async_trait;
use usbackup_config::PostgresqlSpec;
use usbackup_core::{HostEndpoint, PathRef};

pub struct PostgresqlHandler {
    spec: PostgresqlSpec,
    log: RunLog,
}

impl PostgresqlHandler {
    pub fn new(_host: &HostEndpoint, spec: PostgresqlSpec, log: RunLog) -> Self {
        PostgresqlHandler { spec, log }
    }
}

#[async_trait]
impl BackupHandler for PostgresqlHandler {
    fn kind(&self) -> &'static str {
        "postgresql"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        for instance in &self.spec.instances {
            let dump_file = dest.join(&format!("database_{}.sql", instance.host));

            self.log.info(format!(
                "Dumping postgresql databases for \"{}\" to \"{}\"",
                instance, dump_file
            ));

            let mut argv = vec!["pg_dumpall".to_string()];
            let mut cmd_env: Vec<(String, String)> = Vec::new();

            match &self.spec.credentials_file {
                Some(path) => {
                    cmd_env.push(("PGPASSFILE".to_string(), path.display().to_string()));
                }
                None => {
                    cmd_env.push((
                        "PGPASSWORD".to_string(),
                        instance.password.clone().unwrap_or_default(),
                    ));
                    argv.push(format!(
                        "--username={}",
                        instance.user.as_deref().unwrap_or("root")
                    ));
                }
            }

            argv.extend([
                format!("--host={}", instance.host),
                format!("--port={}", instance.port.unwrap_or(5432)),
                format!("--file={}", dump_file.path),
            ]);

            let mut cmd = Cmd::new(argv);
            for (key, value) in cmd_env {
                cmd = cmd.env(key, value);
            }

            let report = cmd.run().await?;
            self.log.debug(report);
        }

        Ok(())
    }
}
