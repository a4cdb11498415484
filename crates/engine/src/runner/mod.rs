// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-source runners: one backup or replication inside one job.

mod backup;
mod replication;

pub use backup::BackupRunner;
pub use replication::ReplicationRunner;

use crate::exec::ExecError;
use usbackup_core::{FailureKind, RunFailure};

/// Classify a filesystem/exec error outside of the handler phase.
fn exec_failure(error: ExecError) -> RunFailure {
    let kind = match &error {
        ExecError::Process { .. } => FailureKind::Process,
        _ => FailureKind::Other,
    };
    RunFailure::new(kind, error.to_string())
}
