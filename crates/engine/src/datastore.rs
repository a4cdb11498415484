// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent key/value store for service state and last-backup records.
//!
//! A single JSON object file, rewritten atomically (write-then-rename) on
//! every `set`. Writes are serialized behind a mutex; reads reflect the
//! last completed write.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use usbackup_core::BackupRecord;

/// Datastore key of the per-source backup records map.
pub const BACKUPS_KEY: &str = "backups";

/// The value type stored under [`BACKUPS_KEY`].
pub type BackupsMap = IndexMap<String, BackupRecord>;

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("failed to access datastore {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt datastore {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value for key \"{key}\": {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct Datastore {
    path: PathBuf,
    entries: Mutex<serde_json::Map<String, Value>>,
}

impl Datastore {
    /// Open (or initialize) the store at the given path. Parent
    /// directories are created as needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatastoreError> {
        let path = path.into();
        let io_err = |source| DatastoreError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let entries = if path.is_file() {
            let text = std::fs::read_to_string(&path).map_err(io_err)?;
            serde_json::from_str(&text).map_err(|source| DatastoreError::Corrupt {
                path: path.clone(),
                source,
            })?
        } else {
            serde_json::Map::new()
        };

        Ok(Datastore {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Read a key. Missing keys and values of the wrong shape read as
    /// `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.lock().get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                tracing::debug!(key, %error, "datastore value has unexpected shape");
                None
            }
        }
    }

    /// Write a key and flush the store to disk.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatastoreError> {
        let encoded = serde_json::to_value(value).map_err(|source| DatastoreError::Encode {
            key: key.to_string(),
            source,
        })?;

        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), encoded);
        self.flush(&entries)
    }

    /// Remove a key if present and flush.
    pub fn remove(&self, key: &str) -> Result<(), DatastoreError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &serde_json::Map<String, Value>) -> Result<(), DatastoreError> {
        let io_err = |source| DatastoreError::Io {
            path: self.path.clone(),
            source,
        };

        let text = serde_json::to_string_pretty(entries).map_err(|source| {
            DatastoreError::Encode {
                key: String::new(),
                source,
            }
        })?;

        // write-then-rename keeps the store readable through a crash
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "datastore_tests.rs"]
mod tests;
