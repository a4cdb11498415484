// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-tree backups: rsync (incremental or full) or a tar archive.

use super::BackupHandler;
use crate::error::EngineError;
use crate::exec::Cmd;
use crate::fs;
use crate::runlog::RunLog;
use async_trait::async_trait;
use std::time::Instant;
use usbackup_config::{FilesMode, FilesSpec};
use usbackup_core::{HostEndpoint, PathRef};

pub struct FilesHandler {
    host: HostEndpoint,
    spec: FilesSpec,
    log: RunLog,
}

impl FilesHandler {
    pub fn new(host: &HostEndpoint, spec: FilesSpec, log: RunLog) -> Self {
        FilesHandler {
            host: host.clone(),
            spec,
            log,
        }
    }

    /// The source paths to copy; the whole filesystem when unrestricted.
    /// Paths get a trailing slash so rsync copies contents, not the dir.
    fn source_paths(&self) -> Result<Vec<String>, EngineError> {
        if self.spec.limit.is_empty() {
            return Ok(vec!["/".to_string()]);
        }

        let mut paths = Vec::new();
        for path in &self.spec.limit {
            if !path.starts_with('/') {
                return Err(EngineError::Handler(format!(
                    "invalid limit \"{}\": path must be absolute",
                    path
                )));
            }
            let mut path = path.clone();
            if !path.ends_with('/') {
                path.push('/');
            }
            paths.push(path);
        }
        Ok(paths)
    }

    fn rsync_options(&self, link_dest: Option<&PathRef>) -> Vec<String> {
        let mut options: Vec<String> = [
            "--archive",
            "--hard-links",
            "--acls",
            "--xattrs",
            "--delete",
            "--delete-during",
            "--relative",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        for exclude in &self.spec.exclude {
            options.push(format!("--exclude={}", exclude));
        }
        if let Some(bwlimit) = self.spec.bwlimit {
            options.push(format!("--bwlimit={}", bwlimit));
        }
        if let Some(link_dest) = link_dest {
            options.push(format!("--link-dest={}", link_dest.path));
        }

        options
    }

    async fn backup_rsync(
        &self,
        dest: &PathRef,
        link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        let options = self.rsync_options(link_dest);

        for path in self.source_paths()? {
            let src = PathRef {
                host: self.host.clone(),
                path,
            };

            self.log
                .info(format!("Copying \"{}\" from \"{}\" to \"{}\"", src.path, self.host, dest));
            let start = Instant::now();

            let stats = fs::rsync(&src, dest, &options).await?;
            self.log.debug(stats);

            self.log.info(format!(
                "Finished copying \"{}\" from \"{}\" in {:.2} seconds",
                src.path,
                self.host,
                start.elapsed().as_secs_f64()
            ));
        }

        Ok(())
    }

    async fn backup_tar(&self, dest: &PathRef) -> Result<(), EngineError> {
        if !self.host.local {
            return Err(EngineError::Handler(
                "archive mode does not support remote sources".to_string(),
            ));
        }

        let archive = dest.join(&format!("{}.tar.gz", self.host)).path;
        let sources = self.source_paths()?;

        self.log
            .info(format!("Archiving {:?} to \"{}\"", sources, archive));

        let mut argv = vec!["tar".to_string(), "-czf".to_string(), archive];
        argv.extend(sources);
        let stats = Cmd::new(argv).run().await?;
        self.log.debug(stats);

        Ok(())
    }
}

#[async_trait]
impl BackupHandler for FilesHandler {
    fn kind(&self) -> &'static str {
        "files"
    }

    async fn backup(
        &self,
        dest: &PathRef,
        link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        match self.spec.mode {
            FilesMode::Incremental => {
                self.log.info("Using incremental backup mode");
                self.backup_rsync(dest, link_dest).await
            }
            FilesMode::Full => {
                self.log.info("Using full backup mode");
                self.backup_rsync(dest, None).await
            }
            FilesMode::Archive => {
                self.log.info("Using archive backup mode");
                self.backup_tar(dest).await
            }
        }
    }
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
