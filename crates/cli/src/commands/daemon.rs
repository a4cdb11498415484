// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `usbackup daemon`: enter the scheduler loop.

use crate::exit_error::ExitError;
use std::path::Path;
use usbackup_daemon::{StatePaths, Supervisor};

pub async fn run(config_path: Option<&Path>) -> Result<(), ExitError> {
    let config = usbackup_config::load(config_path).map_err(ExitError::config)?;

    let supervisor =
        Supervisor::new(config, StatePaths::system()).map_err(ExitError::failure)?;
    supervisor.run_daemon().await.map_err(ExitError::failure)
}
