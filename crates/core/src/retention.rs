// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention policies: per-bucket retained-count over a version list.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown retention bucket \"{0}\"")]
    UnknownBucket(String),

    #[error("invalid retention count \"{0}\" (expected an integer >= 1)")]
    InvalidCount(String),

    #[error("malformed retention entry \"{0}\" (expected bucket=N)")]
    Malformed(String),
}

/// The six retention buckets, in policy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Last,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Bucket {
    /// The strftime key that identifies this bucket's time window, or
    /// `None` for `last` (every version is its own window).
    pub fn window(self) -> Option<&'static str> {
        match self {
            Bucket::Last => None,
            Bucket::Hourly => Some("%Y-%m-%d %H"),
            Bucket::Daily => Some("%Y-%m-%d"),
            Bucket::Weekly => Some("%Y-%W"),
            Bucket::Monthly => Some("%Y-%m"),
            Bucket::Yearly => Some("%Y"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Bucket::Last => "last",
            Bucket::Hourly => "hourly",
            Bucket::Daily => "daily",
            Bucket::Weekly => "weekly",
            Bucket::Monthly => "monthly",
            Bucket::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-bucket retained-count policy. Absent buckets keep nothing beyond
/// what other buckets (and the always-protected newest version) retain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly: Option<u32>,
}

impl RetentionPolicy {
    /// Enabled buckets with their retained counts, in policy order.
    pub fn buckets(&self) -> Vec<(Bucket, u32)> {
        [
            (Bucket::Last, self.last),
            (Bucket::Hourly, self.hourly),
            (Bucket::Daily, self.daily),
            (Bucket::Weekly, self.weekly),
            (Bucket::Monthly, self.monthly),
            (Bucket::Yearly, self.yearly),
        ]
        .into_iter()
        .filter_map(|(bucket, count)| count.map(|count| (bucket, count)))
        .collect()
    }

    /// Parse the CLI spec form `bucket=N,bucket=N,...`.
    pub fn parse_spec(spec: &str) -> Result<RetentionPolicy, PolicyError> {
        let mut policy = RetentionPolicy::default();

        for entry in spec.split(',').filter(|entry| !entry.is_empty()) {
            let (bucket, count) = entry
                .split_once('=')
                .ok_or_else(|| PolicyError::Malformed(entry.to_string()))?;
            let count: u32 = count
                .parse()
                .map_err(|_| PolicyError::InvalidCount(count.to_string()))?;
            if count == 0 {
                return Err(PolicyError::InvalidCount(count.to_string()));
            }

            let slot = match bucket {
                "last" => &mut policy.last,
                "hourly" => &mut policy.hourly,
                "daily" => &mut policy.daily,
                "weekly" => &mut policy.weekly,
                "monthly" => &mut policy.monthly,
                "yearly" => &mut policy.yearly,
                other => return Err(PolicyError::UnknownBucket(other.to_string())),
            };
            *slot = Some(count);
        }

        Ok(policy)
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .buckets()
            .into_iter()
            .map(|(bucket, count)| format!("{}={}", bucket, count))
            .collect();
        write!(f, "{}", entries.join(","))
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
