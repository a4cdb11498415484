// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention: compute the protected set and prune everything else.

use crate::context::BackupContext;
use crate::error::EngineError;
use crate::runlog::RunLog;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use usbackup_core::{RetentionPolicy, Version};

/// Compute the names protected by `policy` over `versions` (ascending).
///
/// Per enabled bucket, versions are walked oldest-first keeping at most N
/// window representatives: a version falling in the same window as its
/// predecessor replaces it (later wins), and the walk stops once a version
/// reaches the current wall-clock window, which is never considered
/// complete. The newest version overall is always protected.
pub fn protected_versions(
    versions: &[Version],
    policy: &RetentionPolicy,
    now: NaiveDateTime,
    log: &RunLog,
) -> BTreeSet<String> {
    let mut protected = BTreeSet::new();

    for (bucket, keep) in policy.buckets() {
        let mut kept: Vec<&Version> = Vec::new();
        let mut prev: Option<NaiveDateTime> = None;

        for version in versions {
            if let Some(window) = bucket.window() {
                if version.date().format(window).to_string() == now.format(window).to_string() {
                    break;
                }
                if let Some(prev) = prev {
                    if version.date().format(window).to_string()
                        == prev.format(window).to_string()
                    {
                        kept.pop();
                    }
                }
            }

            kept.push(version);
            if kept.len() > keep as usize {
                kept.remove(0);
            }
            prev = Some(version.date());
        }

        log.debug(format!(
            "{} protected versions: {:?}",
            bucket,
            kept.iter().map(|v| v.name()).collect::<Vec<_>>()
        ));
        protected.extend(kept.iter().map(|v| v.name().to_string()));
    }

    if let Some(newest) = versions.last() {
        log.debug(format!("Last version protected: {}", newest));
        protected.insert(newest.name().to_string());
    }

    protected
}

/// Apply a retention policy against a context: everything outside the
/// protected set is deleted. Returns the size of the protected set.
pub async fn apply_retention(
    context: &BackupContext,
    policy: &RetentionPolicy,
    now: NaiveDateTime,
    log: &RunLog,
) -> Result<usize, EngineError> {
    log.info(format!("Applying retention policy: {}", policy));

    let versions = context.versions().await?;
    if versions.is_empty() {
        log.info("No backup versions found. Nothing to prune");
        return Ok(0);
    }

    let protected = protected_versions(&versions, policy, now, log);
    if protected.is_empty() {
        // a misconfiguration must never delete everything
        return Err(EngineError::RetentionDegenerate);
    }

    for version in versions
        .iter()
        .filter(|version| !protected.contains(version.name()))
    {
        log.info(format!(
            "Removing {} based on retention policy",
            version.path()
        ));
        context.remove_version(version).await?;
    }

    Ok(protected.len())
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
