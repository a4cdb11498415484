// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run log capture.
//!
//! Runners and handlers log through a `RunLog`, which mirrors each line to
//! the tracing subscriber and buffers it for the job notification body.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RunLog {
    buffer: Arc<Mutex<String>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        tracing::info!("{}", message.as_ref());
        self.append(message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        tracing::warn!("{}", message.as_ref());
        self.append(message.as_ref());
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        tracing::debug!("{}", message.as_ref());
        self.append(message.as_ref());
    }

    fn append(&self, message: &str) {
        let line = format!(
            "{} - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
        self.buffer.lock().push_str(&line);
    }

    /// The buffered lines so far.
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }
}

#[cfg(test)]
#[path = "runlog_tests.rs"]
mod tests;
