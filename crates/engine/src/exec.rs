// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution, locally or wrapped in SSH transport.

use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use usbackup_core::HostEndpoint;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,

    #[error("{message}")]
    Process { code: i32, message: String },

    #[error("cannot copy between two remote endpoints")]
    IllegalTransfer,

    #[error("cannot scp between two local endpoints")]
    LocalTransfer,

    #[error("failed to spawn \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A command to execute, optionally on a remote endpoint.
///
/// ```ignore
/// let uptime = Cmd::new(["uptime"]).on(&endpoint).run().await?;
/// ```
#[derive(Debug)]
pub struct Cmd {
    argv: Vec<String>,
    endpoint: Option<HostEndpoint>,
    input: Option<String>,
    env: Vec<(String, String)>,
    stdout_file: Option<PathBuf>,
}

impl Cmd {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cmd {
            argv: argv.into_iter().map(Into::into).collect(),
            endpoint: None,
            input: None,
            env: Vec::new(),
            stdout_file: None,
        }
    }

    /// Execute on the given endpoint. Local endpoints run directly; remote
    /// ones get the SSH wrapping.
    pub fn on(mut self, endpoint: &HostEndpoint) -> Self {
        self.endpoint = Some(endpoint.clone());
        self
    }

    /// Feed the given string to the child's stdin.
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Stream the child's stdout into a local file instead of capturing it
    /// (zfs send, vzdump).
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file = Some(path.into());
        self
    }

    /// Run to completion and return the captured (trimmed) stdout.
    ///
    /// A non-zero exit status becomes `ExecError::Process` carrying the
    /// child's stderr.
    pub async fn run(self) -> Result<String, ExecError> {
        let argv = match &self.endpoint {
            Some(endpoint) if !endpoint.local => ssh_wrap(&self.argv, endpoint),
            _ => self.argv.clone(),
        };
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;

        tracing::debug!(command = %argv.join(" "), "executing command");

        let mut command = tokio::process::Command::new(program);
        command.args(args).stderr(Stdio::piped()).kill_on_drop(true);
        command.stdin(if self.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        match &self.stdout_file {
            Some(path) => {
                let file = std::fs::File::create(path)?;
                command.stdout(Stdio::from(file));
            }
            None => {
                command.stdout(Stdio::piped());
            }
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            command: program.clone(),
            source,
        })?;

        if let Some(input) = &self.input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
                // closing stdin lets the child see EOF
                drop(stdin);
            }
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ExecError::Process {
                code: output.status.code().unwrap_or(-1),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Wrap an argv for execution on a remote endpoint.
///
/// Without a password the connection is forced non-interactive
/// (`BatchMode`); with one, `sshpass` feeds it so no prompt ever blocks
/// the engine.
pub fn ssh_wrap(argv: &[String], endpoint: &HostEndpoint) -> Vec<String> {
    let mut wrapped: Vec<String> = Vec::new();

    if let Some(password) = &endpoint.password {
        tracing::warn!(
            host = %endpoint.host,
            "using a plain password is insecure; consider ssh keys instead"
        );
        wrapped.extend(["sshpass".to_string(), "-p".to_string(), password.clone()]);
    }

    wrapped.push("ssh".to_string());

    if endpoint.password.is_none() {
        wrapped.extend([
            "-o".to_string(),
            "PasswordAuthentication=No".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ]);
    }
    if let Some(port) = endpoint.port {
        wrapped.extend(["-p".to_string(), port.to_string()]);
    }

    wrapped.push(endpoint.ssh_target());
    wrapped.push("exec".to_string());
    wrapped.push(shell_join(argv));

    wrapped
}

/// Join an argv into a single shell word sequence, quoting as needed.
fn shell_join(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}

/// A host is reachable when a trivial command round-trips through it.
pub async fn is_reachable(endpoint: &HostEndpoint) -> bool {
    Cmd::new(["echo", "1"]).on(endpoint).run().await.is_ok()
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
