// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stub handlers and notifiers for tests.

use crate::error::EngineError;
use crate::handlers::BackupHandler;
use crate::notify::{JobStatus, NotificationHandler};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use usbackup_core::{PathRef, RunResult};

/// Records every `backup` call; optionally fails, optionally drops a
/// marker file into its destination so rollback can be observed.
pub struct StubHandler {
    kind: &'static str,
    fail: bool,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl StubHandler {
    pub fn ok(kind: &'static str) -> Self {
        StubHandler {
            kind,
            fail: false,
            delay: None,
            calls: Arc::default(),
        }
    }

    pub fn failing(kind: &'static str) -> Self {
        StubHandler {
            fail: true,
            ..StubHandler::ok(kind)
        }
    }

    pub fn slow(kind: &'static str, delay: Duration) -> Self {
        StubHandler {
            delay: Some(delay),
            ..StubHandler::ok(kind)
        }
    }

    /// `(dest, link_dest)` pairs seen so far, shared across clones of the
    /// handle.
    pub fn calls(&self) -> Arc<Mutex<Vec<(String, Option<String>)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl BackupHandler for StubHandler {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn backup(
        &self,
        dest: &PathRef,
        link_dest: Option<&PathRef>,
    ) -> Result<(), EngineError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls
            .lock()
            .push((dest.path.clone(), link_dest.map(|p| p.path.clone())));

        if self.fail {
            return Err(EngineError::Handler(format!(
                "stub handler \"{}\" failed",
                self.kind
            )));
        }

        tokio::fs::write(format!("{}/data.txt", dest.path), self.kind)
            .await
            .map_err(|e| EngineError::Handler(e.to_string()))?;
        Ok(())
    }
}

/// Records notification statuses; optionally fails.
pub struct RecordingNotifier {
    fail: bool,
    sent: Arc<Mutex<Vec<JobStatus>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier {
            fail: false,
            sent: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        RecordingNotifier {
            fail: true,
            sent: Arc::default(),
        }
    }

    pub fn sent(&self) -> Arc<Mutex<Vec<JobStatus>>> {
        Arc::clone(&self.sent)
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationHandler for RecordingNotifier {
    fn kind(&self) -> &'static str {
        "recording"
    }

    async fn notify(
        &self,
        status: JobStatus,
        _results: &[RunResult],
        _elapsed: Duration,
    ) -> Result<(), EngineError> {
        if self.fail {
            return Err(EngineError::Handler("recording notifier failed".to_string()));
        }
        self.sent.lock().push(status);
        Ok(())
    }
}
