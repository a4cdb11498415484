// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for CLI specs.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Captured stdout of a finished assert.
pub fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

/// Does a directory name follow the `%Y_%m_%d-%H_%M_%S` version format?
pub fn is_version_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() != "0000_00_00-00_00_00".len() {
        return false;
    }
    name.char_indices().all(|(index, c)| match index {
        4 | 7 | 13 | 16 => c == '_',
        10 => c == '-',
        _ => c.is_ascii_digit(),
    })
}

/// A scratch project: a tempdir holding a config file, storage roots and
/// (through `$HOME` redirection) the state files of a non-root run.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Project {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the project, creating parent directories.
    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }

    /// The usbackup binary, homed into this project so state files stay
    /// inside the tempdir (unless running as root, where system paths
    /// apply).
    pub fn usbackup(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("usbackup").expect("usbackup binary");
        cmd.env("HOME", self.dir.path());
        cmd
    }

    /// A minimal valid config: one localhost source without handlers, one
    /// storage rooted in the project.
    pub fn minimal_config(&self) -> PathBuf {
        std::fs::create_dir_all(self.path().join("storage")).expect("create storage root");
        let text = format!(
            r#"
sources:
  - name: local
    host: localhost
storages:
  - name: main
    path: {}/storage
jobs:
  - name: nightly
    dest: main
    notification_policy: never
"#,
            self.path().display()
        );
        self.file("config.yml", &text)
    }
}
