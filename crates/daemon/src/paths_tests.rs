// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_paths_are_absolute() {
    let paths = StatePaths::system();
    assert!(paths.pid_file.to_string_lossy().ends_with("usbackup.pid"));
    assert!(paths.datastore.to_string_lossy().ends_with("usbackup.db"));
}

#[test]
fn under_roots_both_paths() {
    let paths = StatePaths::under("/tmp/state");
    assert_eq!(paths.pid_file, PathBuf::from("/tmp/state/usbackup.pid"));
    assert_eq!(paths.datastore, PathBuf::from("/tmp/state/usbackup.db"));
}
