// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `stats` surface: service state and last-backup records.

use serde::Serialize;
use usbackup_engine::{datastore::BackupsMap, Datastore, BACKUPS_KEY};

#[derive(Debug, Serialize)]
pub struct ServiceStats {
    pub running: bool,
    pub last_manual_run: Option<String>,
    pub last_scheduled_run: Option<String>,
    pub backups: BackupsMap,
}

impl ServiceStats {
    pub fn load(datastore: &Datastore) -> Self {
        ServiceStats {
            running: datastore.get("running").unwrap_or(false),
            last_manual_run: datastore.get("last_manual_run"),
            last_scheduled_run: datastore.get("last_scheduled_run"),
            backups: datastore.get(BACKUPS_KEY).unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable rendering, one tree branch per recorded source.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "Service: {}\n",
            if self.running { "running" } else { "not running" }
        ));
        out.push_str(&format!(
            "Last scheduled run: {}\n",
            self.last_scheduled_run.as_deref().unwrap_or("never")
        ));
        out.push_str(&format!(
            "Last manual run: {}\n",
            self.last_manual_run.as_deref().unwrap_or("never")
        ));

        if self.backups.is_empty() {
            out.push_str("Backups: none recorded\n");
            return out;
        }

        out.push_str("Backups:\n");
        let count = self.backups.len();
        for (index, (source, record)) in self.backups.iter().enumerate() {
            let branch = if index + 1 == count { "└──" } else { "├──" };
            let status = match &record.error {
                None => "OK".to_string(),
                Some(error) => format!("Failed ({})", error.message),
            };
            out.push_str(&format!(
                "{} {}: {} at {} ({:.2}s) -> {}\n",
                branch, source, status, record.date, record.elapsed_secs, record.dest
            ));
        }

        out
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
