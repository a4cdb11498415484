// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-addressable filesystem operations built on [`Cmd`].
//!
//! Every operation runs through a subprocess on the path's endpoint, so
//! the same code manages local and SSH-reachable trees.

use crate::exec::{Cmd, ExecError};
use usbackup_core::{HostEndpoint, PathRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Any,
    File,
    Dir,
}

async fn run_at(path: &PathRef, argv: Vec<String>) -> Result<String, ExecError> {
    Cmd::new(argv).on(&path.host).run().await
}

/// `mkdir -p`: create a directory and its parents.
pub async fn mkdir_p(path: &PathRef) -> Result<(), ExecError> {
    run_at(path, vec!["mkdir".into(), "-p".into(), path.path.clone()])
        .await
        .map(drop)
}

/// Plain `mkdir`: fails when the directory already exists. Used where
/// creation doubles as a collision check.
pub async fn mkdir(path: &PathRef) -> Result<(), ExecError> {
    run_at(path, vec!["mkdir".into(), path.path.clone()])
        .await
        .map(drop)
}

/// List the names of a directory's children. A failing `ls` (typically a
/// missing directory) lists as empty.
pub async fn ls(path: &PathRef) -> Result<Vec<String>, ExecError> {
    match run_at(path, vec!["ls".into(), path.path.clone()]).await {
        Ok(output) => Ok(output.lines().map(str::to_string).collect()),
        Err(ExecError::Process { .. }) => Ok(Vec::new()),
        Err(other) => Err(other),
    }
}

pub async fn rm_rf(path: &PathRef) -> Result<(), ExecError> {
    run_at(path, vec!["rm".into(), "-rf".into(), path.path.clone()])
        .await
        .map(drop)
}

pub async fn touch(path: &PathRef) -> Result<(), ExecError> {
    run_at(path, vec!["touch".into(), path.path.clone()])
        .await
        .map(drop)
}

pub async fn exists(path: &PathRef, kind: PathKind) -> Result<bool, ExecError> {
    let test_flag = match kind {
        PathKind::Any => "-e",
        PathKind::File => "-f",
        PathKind::Dir => "-d",
    };
    match run_at(
        path,
        vec!["test".into(), test_flag.into(), path.path.clone()],
    )
    .await
    {
        Ok(_) => Ok(true),
        Err(ExecError::Process { .. }) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Copy `src` to `dst` with rsync. At most one side may be remote; its
/// endpoint supplies the SSH transport options.
pub async fn rsync(src: &PathRef, dst: &PathRef, extra: &[String]) -> Result<String, ExecError> {
    let argv = rsync_argv(src, dst, extra)?;
    Cmd::new(argv).run().await
}

fn transport_ssh_opts(endpoint: &HostEndpoint) -> (Vec<String>, Vec<String>) {
    let mut prefix = Vec::new();
    let mut ssh_opts = Vec::new();

    if let Some(password) = &endpoint.password {
        prefix.extend(["sshpass".to_string(), "-p".to_string(), password.clone()]);
    } else {
        ssh_opts.extend([
            "-o".to_string(),
            "PasswordAuthentication=No".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ]);
    }
    if let Some(port) = endpoint.port {
        ssh_opts.extend(["-p".to_string(), port.to_string()]);
    }

    (prefix, ssh_opts)
}

fn rsync_argv(src: &PathRef, dst: &PathRef, extra: &[String]) -> Result<Vec<String>, ExecError> {
    if !src.is_local() && !dst.is_local() {
        return Err(ExecError::IllegalTransfer);
    }

    let remote = [src, dst].into_iter().find(|p| !p.is_local());

    let mut prefix = Vec::new();
    let mut options: Vec<String> = extra.to_vec();

    if let Some(remote) = remote {
        let (pw_prefix, ssh_opts) = transport_ssh_opts(&remote.host);
        prefix = pw_prefix;
        if !ssh_opts.is_empty() {
            options.push(format!("--rsh=ssh {}", ssh_opts.join(" ")));
        }
    }

    options.push("--out-format=%t %i %f".to_string());
    options.push("--stats".to_string());

    let mut argv = prefix;
    argv.push("rsync".to_string());
    argv.extend(options);
    argv.push(src.transfer_target());
    argv.push(dst.transfer_target());
    Ok(argv)
}

/// Copy `src` to `dst` with scp. Exactly one side must be remote.
pub async fn scp(src: &PathRef, dst: &PathRef) -> Result<String, ExecError> {
    let argv = scp_argv(src, dst)?;
    Cmd::new(argv).run().await
}

fn scp_argv(src: &PathRef, dst: &PathRef) -> Result<Vec<String>, ExecError> {
    if !src.is_local() && !dst.is_local() {
        return Err(ExecError::IllegalTransfer);
    }
    if src.is_local() && dst.is_local() {
        return Err(ExecError::LocalTransfer);
    }

    let remote = [src, dst]
        .into_iter()
        .find(|p| !p.is_local())
        .ok_or(ExecError::LocalTransfer)?;

    let (prefix, mut ssh_opts) = transport_ssh_opts(&remote.host);
    // scp spells the port flag -P
    if let Some(index) = ssh_opts.iter().position(|opt| opt == "-p") {
        ssh_opts[index] = "-P".to_string();
    }

    let mut argv = prefix;
    argv.push("scp".to_string());
    argv.extend(ssh_opts);
    argv.push(src.transfer_target());
    argv.push(dst.transfer_target());
    Ok(argv)
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
