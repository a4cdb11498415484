// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! Runner failures never cross the runner boundary as errors; they are
//! converted into [`RunFailure`] values inside the `RunResult`.

use crate::cleanup::CleanupError;
use crate::exec::ExecError;
use thiserror::Error;
use usbackup_core::{FailureKind, RunFailure};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("backup already running")]
    AlreadyRunning,

    #[error("host \"{0}\" is not reachable")]
    Unreachable(String),

    #[error("version \"{0}\" already exists")]
    VersionClash(String),

    #[error("retention computed an empty protected set; pruning refused")]
    RetentionDegenerate,

    #[error("no backup version found to replicate")]
    NothingToReplicate,

    #[error("job \"{0}\" matches no sources")]
    NoSources(String),

    #[error("unknown storage \"{0}\"")]
    UnknownStorage(String),

    #[error("{0}")]
    Handler(String),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),
}

impl EngineError {
    /// The failure kind this error classifies as when captured into a
    /// `RunResult` outside of a specific runner phase.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            EngineError::AlreadyRunning => FailureKind::AlreadyRunning,
            EngineError::Unreachable(_) => FailureKind::Unreachable,
            EngineError::VersionClash(_) => FailureKind::VersionClash,
            EngineError::RetentionDegenerate => FailureKind::Retention,
            EngineError::Handler(_) => FailureKind::Handler,
            EngineError::Exec(ExecError::Process { .. }) => FailureKind::Process,
            _ => FailureKind::Other,
        }
    }

    pub fn into_failure(self) -> RunFailure {
        RunFailure::new(self.failure_kind(), self.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
