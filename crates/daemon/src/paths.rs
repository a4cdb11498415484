// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known state paths: the PID file and the datastore.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StatePaths {
    pub pid_file: PathBuf,
    pub datastore: PathBuf,
}

impl StatePaths {
    /// System locations when running as root, dotfiles in `$HOME`
    /// otherwise.
    pub fn system() -> Self {
        if nix::unistd::Uid::effective().is_root() {
            return StatePaths {
                pid_file: PathBuf::from("/var/run/usbackup.pid"),
                datastore: PathBuf::from("/var/opt/usbackup/usbackup.db"),
            };
        }

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        StatePaths {
            pid_file: home.join(".usbackup.pid"),
            datastore: home.join(".usbackup/usbackup.db"),
        }
    }

    /// Paths rooted under an arbitrary directory (tests, containers).
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        StatePaths {
            pid_file: root.join("usbackup.pid"),
            datastore: root.join("usbackup.db"),
        }
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
