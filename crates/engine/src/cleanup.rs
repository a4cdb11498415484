// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred-action queue guaranteeing resource release on shutdown.
//!
//! `push` registers without running, `consume` is the happy-path release,
//! `drain` is the catch-all on shutdown. Drain order is LIFO so outer
//! acquisitions are released last. The queue is process-scoped, owned by
//! the supervisor and passed explicitly through constructors.

use crate::error::EngineError;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CleanupError {
    #[error("cleanup entry \"{0}\" already exists")]
    DuplicateId(String),

    #[error("cleanup entry \"{0}\" not found")]
    UnknownId(String),
}

type CleanupAction = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), EngineError>> + Send>;

#[derive(Default)]
pub struct CleanupQueue {
    entries: Mutex<Vec<(String, CleanupAction)>>,
}

impl CleanupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deferred action under a unique id without running it.
    pub fn push<F, Fut>(&self, id: impl Into<String>, action: F) -> Result<(), CleanupError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), EngineError>> + Send + 'static,
    {
        let id = id.into();
        let mut entries = self.entries.lock();
        if entries.iter().any(|(existing, _)| *existing == id) {
            return Err(CleanupError::DuplicateId(id));
        }
        let boxed: CleanupAction =
            Box::new(move || Box::pin(action()) as BoxFuture<'static, Result<(), EngineError>>);
        entries.push((id, boxed));
        Ok(())
    }

    /// Remove an entry without executing it. Callers must know what they
    /// deferred: an unknown id is an error, not a no-op.
    pub fn pop(&self, id: &str) -> Result<(), CleanupError> {
        let mut entries = self.entries.lock();
        let index = entries
            .iter()
            .position(|(existing, _)| existing == id)
            .ok_or_else(|| CleanupError::UnknownId(id.to_string()))?;
        entries.remove(index);
        Ok(())
    }

    /// Remove an entry and execute it.
    pub async fn consume(&self, id: &str) -> Result<(), EngineError> {
        let action = {
            let mut entries = self.entries.lock();
            let index = entries
                .iter()
                .position(|(existing, _)| existing == id)
                .ok_or_else(|| CleanupError::UnknownId(id.to_string()))?;
            entries.remove(index).1
        };
        action().await
    }

    /// Execute every remaining entry, most recently pushed first. Action
    /// errors are logged and do not abort the drain.
    pub async fn drain(&self) {
        loop {
            let entry = self.entries.lock().pop();
            let Some((id, action)) = entry else { break };

            tracing::debug!(id = %id, "running deferred cleanup action");
            if let Err(error) = action().await {
                tracing::warn!(id = %id, error = %error, "cleanup action failed");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
