// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! usbackup: scheduled multi-source backup orchestrator.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod exit_error;
mod logging;

use clap::{Parser, Subcommand};
use exit_error::ExitError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "usbackup", version, about = "Scheduled multi-source backup orchestrator")]
struct Cli {
    /// Alternative config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file where to write logs
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run as daemon and perform actions based on configured jobs
    Daemon,
    /// Run a job based on the provided parameters
    Run(commands::run::RunArgs),
    /// Test the configuration file
    Configtest,
    /// Show service state and last-backup records
    Stats(commands::stats::StatsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stats is a query surface: keep it quiet unless asked otherwise
    let default_level = match cli.command {
        Command::Stats(_) => "WARNING",
        _ => "INFO",
    };
    let level = cli.log_level.as_deref().unwrap_or(default_level);
    let _log_guard = match logging::init(cli.log.as_deref(), level) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("Failed to set up logging: {error}");
            return ExitCode::from(1);
        }
    };

    let outcome = match cli.command {
        Command::Daemon => commands::daemon::run(cli.config.as_deref()).await,
        Command::Run(args) => commands::run::run(cli.config.as_deref(), args).await,
        Command::Configtest => commands::configtest::run(cli.config.as_deref()),
        Command::Stats(args) => commands::stats::run(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(error.code)
        }
    }
}
