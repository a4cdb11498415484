// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `usbackup stats`: print service state and last-backup records.

use crate::exit_error::ExitError;
use clap::Args;
use usbackup_daemon::{ServiceStats, StatePaths};
use usbackup_engine::Datastore;

#[derive(Args)]
pub struct StatsArgs {
    /// Output the stats in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs) -> Result<(), ExitError> {
    let paths = StatePaths::system();
    let datastore = Datastore::open(&paths.datastore).map_err(ExitError::failure)?;
    let stats = ServiceStats::load(&datastore);

    if args.json {
        println!("{}", stats.to_json().map_err(ExitError::failure)?);
    } else {
        print!("{}", stats.render());
    }

    Ok(())
}
