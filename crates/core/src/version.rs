// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp-named backup versions.

use crate::path::PathRef;
use chrono::NaiveDateTime;
use std::fmt;

/// Directory-name format of a version, second-granular.
///
/// Lexicographic ordering of names equals chronological ordering of dates.
pub const VERSION_FORMAT: &str = "%Y_%m_%d-%H_%M_%S";

/// One backup snapshot inside a source's destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    name: String,
    path: PathRef,
    date: NaiveDateTime,
}

impl Version {
    /// Parse a directory name into a version. Returns `None` for children
    /// that do not follow the version format; those are not versions.
    pub fn from_name(name: &str, parent: &PathRef) -> Option<Version> {
        let date = NaiveDateTime::parse_from_str(name, VERSION_FORMAT).ok()?;
        Some(Version {
            name: name.to_string(),
            path: parent.join(name),
            date,
        })
    }

    /// The version a run started at `date` would create.
    pub fn for_date(date: NaiveDateTime, parent: &PathRef) -> Version {
        let name = date.format(VERSION_FORMAT).to_string();
        Version {
            path: parent.join(&name),
            name,
            date,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &PathRef {
        &self.path
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
