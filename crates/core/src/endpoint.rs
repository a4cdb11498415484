// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-or-remote execution targets.
//!
//! Accepted remote formats:
//!   - `hostname`
//!   - `hostname:port`
//!   - `username@hostname`
//!   - `username@hostname:port`
//!   - `username:password@hostname`
//!   - `username:password@hostname:port`

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("invalid remote string \"{0}\"")]
    Invalid(String),

    #[error("invalid port in \"{0}\"")]
    InvalidPort(String),
}

/// An execution target: a host plus optional credentials.
///
/// `local` is true iff the host is `localhost` or the machine's own
/// hostname; local endpoints are executed directly, everything else goes
/// through SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEndpoint {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub local: bool,
}

impl HostEndpoint {
    pub fn localhost() -> Self {
        HostEndpoint {
            host: "localhost".to_string(),
            user: None,
            password: None,
            port: None,
            local: true,
        }
    }

    /// The `[user@]host` form used by ssh and scp.
    pub fn ssh_target(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

fn is_local_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }
    hostname::get()
        .map(|name| name.to_string_lossy() == host)
        .unwrap_or(false)
}

impl FromStr for HostEndpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EndpointError::Invalid(s.to_string());

        let (credentials, host_part) = match s.rsplit_once('@') {
            Some((credentials, rest)) => (Some(credentials), rest),
            None => (None, s),
        };

        let (user, password) = match credentials {
            Some(credentials) => {
                let (user, password) = match credentials.split_once(':') {
                    Some((user, password)) => (user, Some(password.to_string())),
                    None => (credentials, None),
                };
                if user.is_empty() {
                    return Err(invalid());
                }
                (Some(user.to_string()), password)
            }
            None => (None, None),
        };

        let (host, port) = match host_part.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| EndpointError::InvalidPort(s.to_string()))?;
                (host, Some(port))
            }
            None => (host_part, None),
        };

        if host.is_empty() || host.contains('/') {
            return Err(invalid());
        }

        Ok(HostEndpoint {
            local: is_local_host(host),
            host: host.to_string(),
            user,
            password,
            port,
        })
    }
}

impl fmt::Display for HostEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)
    }
}

impl Serialize for HostEndpoint {
    // Credentials are deliberately omitted: the serialized form feeds logs
    // and the stats surface, never a config round-trip.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = self.ssh_target();
        if let Some(port) = self.port {
            out.push_str(&format!(":{}", port));
        }
        serializer.serialize_str(&out)
    }
}

impl<'de> Deserialize<'de> for HostEndpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
