// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-source run outcomes.
//!
//! Runner failures are values, not propagated errors: a `RunResult` carries
//! an optional `RunFailure` and the captured run log, and the coordinator
//! persists a serializable `BackupRecord` per source.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Coarse classification of a run failure, mirroring the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    AlreadyRunning,
    Unreachable,
    VersionClash,
    Handler,
    Retention,
    Process,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::AlreadyRunning => "already-running",
            FailureKind::Unreachable => "unreachable",
            FailureKind::VersionClash => "version-clash",
            FailureKind::Handler => "handler",
            FailureKind::Retention => "retention",
            FailureKind::Process => "process",
            FailureKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RunFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        RunFailure {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The outcome of one source's run within one job.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub source: String,
    pub dest: String,
    pub started_at: NaiveDateTime,
    pub elapsed: Duration,
    pub error: Option<RunFailure>,
    pub log: String,
}

impl RunResult {
    /// A result synthesized for a runner that never produced one (task
    /// panicked, runner construction failed).
    pub fn failed(source: &str, started_at: NaiveDateTime, error: RunFailure) -> Self {
        RunResult {
            source: source.to_string(),
            dest: String::new(),
            started_at,
            elapsed: Duration::ZERO,
            error: Some(error),
            log: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Serialized per-source outcome, as stored under `backups.<source>` in the
/// datastore and surfaced by `stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub source: String,
    pub dest: String,
    pub date: String,
    pub elapsed_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
}

impl From<&RunResult> for BackupRecord {
    fn from(result: &RunResult) -> Self {
        BackupRecord {
            source: result.source.clone(),
            dest: result.dest.clone(),
            date: result.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            elapsed_secs: result.elapsed.as_secs_f64(),
            error: result.error.clone(),
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
