// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `usbackup configtest`: parse and validate the configuration.

use crate::exit_error::ExitError;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), ExitError> {
    match usbackup_config::load(config_path) {
        Ok(_) => {
            println!("Configuration file is valid");
            Ok(())
        }
        Err(error) => Err(ExitError::config(format!(
            "Configuration file is invalid:\n{error}"
        ))),
    }
}
