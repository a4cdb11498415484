// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-(source, storage) backup workspace.
//!
//! A context is a pure view over `<storage.path>/<source.name>/`: it
//! enumerates versions, mints fresh version directories and manages the
//! per-source `backup.lock`. Its only state is an optional cache of the
//! version listing, valid within a single run.

use crate::error::EngineError;
use crate::exec::ExecError;
use crate::fs::{self, PathKind};
use crate::runlog::RunLog;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::sync::Arc;
use usbackup_core::{PathRef, Version};

const LOCK_FILE: &str = "backup.lock";

struct Inner {
    name: String,
    root: PathRef,
    log: RunLog,
    versions: Mutex<Option<Vec<Version>>>,
}

#[derive(Clone)]
pub struct BackupContext {
    inner: Arc<Inner>,
}

impl BackupContext {
    pub fn new(source_name: &str, storage_root: &PathRef, log: RunLog) -> Self {
        BackupContext {
            inner: Arc::new(Inner {
                name: source_name.to_string(),
                root: storage_root.join(source_name),
                log,
                versions: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn root(&self) -> &PathRef {
        &self.inner.root
    }

    /// Create the workspace root if missing.
    pub async fn ensure_destination(&self) -> Result<(), ExecError> {
        if !fs::exists(&self.inner.root, PathKind::Dir).await? {
            self.inner
                .log
                .info(format!("Creating destination directory {}", self.inner.root));
            fs::mkdir_p(&self.inner.root).await?;
        }
        Ok(())
    }

    /// The version list, ascending by date. Children whose names do not
    /// parse as versions are silently skipped. Cached within a run.
    pub async fn versions(&self) -> Result<Vec<Version>, ExecError> {
        if let Some(cached) = self.inner.versions.lock().clone() {
            return Ok(cached);
        }

        let mut versions: Vec<Version> = fs::ls(&self.inner.root)
            .await?
            .iter()
            .filter_map(|name| Version::from_name(name, &self.inner.root))
            .collect();
        versions.sort_by_key(Version::date);

        *self.inner.versions.lock() = Some(versions.clone());
        Ok(versions)
    }

    pub async fn latest_version(&self) -> Result<Option<Version>, ExecError> {
        Ok(self.versions().await?.into_iter().last())
    }

    /// Mint the version directory for a run starting at `now`.
    ///
    /// Creation uses plain `mkdir`, so a second run within the same second
    /// fails fast instead of sharing a directory.
    pub async fn generate_version(&self, now: NaiveDateTime) -> Result<Version, EngineError> {
        let version = Version::for_date(now, &self.inner.root);

        if fs::exists(version.path(), PathKind::Dir).await? {
            return Err(EngineError::VersionClash(version.name().to_string()));
        }

        self.inner
            .log
            .info(format!("Creating version directory {}", version.path()));
        fs::mkdir(version.path()).await?;
        self.invalidate();

        Ok(version)
    }

    /// Delete a version directory recursively. A missing directory logs a
    /// warning and counts as removed.
    pub async fn remove_version(&self, version: &Version) -> Result<(), ExecError> {
        if !fs::exists(version.path(), PathKind::Any).await? {
            self.inner
                .log
                .warn(format!("Version \"{}\" does not exist", version));
            return Ok(());
        }

        fs::rm_rf(version.path()).await?;
        self.invalidate();
        self.inner.log.info(format!("Removed version \"{}\"", version));
        Ok(())
    }

    /// Drop the cached version listing.
    pub fn invalidate(&self) {
        *self.inner.versions.lock() = None;
    }

    fn lock_path(&self) -> PathRef {
        self.inner.root.join(LOCK_FILE)
    }

    pub async fn lock_exists(&self) -> Result<bool, ExecError> {
        fs::exists(&self.lock_path(), PathKind::File).await
    }

    /// Create the lock file. Content is irrelevant; existence is the
    /// signal.
    pub async fn create_lock(&self) -> Result<(), ExecError> {
        fs::touch(&self.lock_path()).await
    }

    pub async fn remove_lock(&self) -> Result<(), ExecError> {
        fs::rm_rf(&self.lock_path()).await
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
