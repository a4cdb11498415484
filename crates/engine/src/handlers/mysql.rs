// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MySQL dumps: enumerate databases per instance, `mysqldump` each into a
//! temp directory on the source host, then pull the dumps down.

use super::BackupHandler;
use crate::cleanup::CleanupQueue;
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::fs;
use crate::runlog::RunLog;
use async_trait::async_trait;
use std::sync::Arc;
use usbackup_config::MysqlSpec;
use usbackup_core::{HostEndpoint, PathRef};
use uuid::Uuid;

const SYSTEM_SCHEMAS: [&str; 3] = ["information_schema", "performance_schema", "sys"];

pub struct MysqlHandler {
    host: HostEndpoint,
    spec: MysqlSpec,
    cleanup: Arc<CleanupQueue>,
    log: RunLog,
    id: Uuid,
}

impl MysqlHandler {
    pub fn new(
        host: &HostEndpoint,
        spec: MysqlSpec,
        cleanup: Arc<CleanupQueue>,
        log: RunLog,
    ) -> Self {
        MysqlHandler {
            host: host.clone(),
            spec,
            cleanup,
            log,
            id: Uuid::new_v4(),
        }
    }

    /// Connection options shared by `mysql` and `mysqldump`.
    async fn connection_options(
        &self,
        instance: &HostEndpoint,
    ) -> Result<Vec<String>, EngineError> {
        let (user, password) = match &self.spec.credentials_file {
            Some(path) => {
                let line = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| EngineError::Handler(format!("credentials file: {e}")))?;
                let line = line.lines().next().unwrap_or("").trim().to_string();
                let (user, password) = line.split_once(':').ok_or_else(|| {
                    EngineError::Handler("credentials file must contain user:password".to_string())
                })?;
                (user.to_string(), password.to_string())
            }
            None => (
                instance.user.clone().unwrap_or_else(|| "root".to_string()),
                instance.password.clone().unwrap_or_default(),
            ),
        };

        Ok(vec![
            format!("--user={}", user),
            format!("--password={}", password),
            format!("--host={}", instance.host),
            format!("--port={}", instance.port.unwrap_or(3306)),
        ])
    }

    async fn databases(&self, options: &[String]) -> Result<Vec<String>, EngineError> {
        let mut argv = vec!["mysql".to_string()];
        argv.extend(options.iter().cloned());
        argv.extend([
            "--silent".to_string(),
            "--raw".to_string(),
            "--execute=SHOW DATABASES".to_string(),
        ]);

        let output = Cmd::new(argv).on(&self.host).run().await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !SYSTEM_SCHEMAS.contains(line))
            .map(str::to_string)
            .collect())
    }

    async fn dump_database(
        &self,
        database: &str,
        dump_dir: &str,
        options: &[String],
    ) -> Result<(), EngineError> {
        let mut argv = vec!["mysqldump".to_string()];
        argv.extend(options.iter().cloned());
        argv.extend([
            "--column-statistics=0".to_string(),
            "--no-tablespaces".to_string(),
            "--single-transaction".to_string(),
            "--routines".to_string(),
            "--triggers".to_string(),
            "--lock-tables=false".to_string(),
            format!("--result-file={}/{}.sql", dump_dir, database),
            database.to_string(),
        ]);

        Cmd::new(argv).on(&self.host).run().await?;
        Ok(())
    }
}

#[async_trait]
impl BackupHandler for MysqlHandler {
    fn kind(&self) -> &'static str {
        "mysql"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        _link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        let tmp_dir = PathRef {
            host: self.host.clone(),
            path: format!("/tmp/{}", self.id),
        };

        let cleanup_id = format!("remove_mysql_tmp_{}", self.id);
        let tmp_for_cleanup = tmp_dir.clone();
        self.cleanup.push(&cleanup_id, move || async move {
            fs::rm_rf(&tmp_for_cleanup).await.map_err(EngineError::from)
        })?;

        for instance in &self.spec.instances {
            let options = self.connection_options(instance).await?;

            let databases = self.databases(&options).await?;
            if databases.is_empty() {
                self.log
                    .info(format!("No databases found for \"{}\"", instance));
                continue;
            }

            let instance_dir = tmp_dir.join(&instance.host);
            self.log.info(format!(
                "Creating tmp folder \"{}\" on \"{}\"",
                instance_dir.path, self.host
            ));
            fs::mkdir_p(&instance_dir).await?;

            for database in &databases {
                self.log.info(format!(
                    "Generating mysql dump for database \"{}\" on \"{}\"",
                    database, self.host
                ));
                self.dump_database(database, &instance_dir.path, &options)
                    .await?;
            }

            self.log
                .info(format!("Copying mysql dumps from \"{}\" to \"{}\"", self.host, dest));
            fs::rsync(&instance_dir, dest, &["--recursive".to_string()]).await?;
        }

        self.log
            .info(format!("Deleting tmp folder \"{}\" on \"{}\"", tmp_dir.path, self.host));
        self.cleanup.consume(&cleanup_id).await?;

        Ok(())
    }
}
