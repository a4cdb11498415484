// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint-qualified absolute paths.
//!
//! A `PathRef` is written `[host]<absolute-path>`; without a host prefix the
//! path refers to localhost. The host prefix accepts the full endpoint
//! syntax, e.g. `root@nas.lan:2222/srv/backups`.

use crate::endpoint::HostEndpoint;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path string \"{0}\" (path must be absolute)")]
    Invalid(String),

    #[error(transparent)]
    Endpoint(#[from] crate::endpoint::EndpointError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRef {
    pub host: HostEndpoint,
    pub path: String,
}

impl PathRef {
    /// A path on localhost.
    pub fn local(path: impl Into<String>) -> Self {
        PathRef {
            host: HostEndpoint::localhost(),
            path: path.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.host.local
    }

    /// Append a path segment.
    pub fn join(&self, segment: &str) -> PathRef {
        let mut path = self.path.clone();
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(segment.trim_start_matches('/'));
        PathRef {
            host: self.host.clone(),
            path,
        }
    }

    /// The argv form understood by rsync and scp: `[user@]host:path` for
    /// remote paths, the bare path for local ones.
    pub fn transfer_target(&self) -> String {
        if self.is_local() {
            self.path.clone()
        } else {
            format!("{}:{}", self.host.ssh_target(), self.path)
        }
    }
}

impl FromStr for PathRef {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slash = s.find('/').ok_or_else(|| PathError::Invalid(s.to_string()))?;
        let (host_part, path) = s.split_at(slash);

        let host = if host_part.is_empty() {
            HostEndpoint::localhost()
        } else {
            host_part.parse()?
        };

        Ok(PathRef {
            host,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}{}", self.host, self.path)
        }
    }
}

impl Serialize for PathRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PathRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
