// Batch event channel - decouples the engine from any particular front end

use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};

/// Severity of a log line surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Message published by the engine while a batch or preview runs.
///
/// Observers (terminal printer, test harness) subscribe to the receiving half;
/// the engine only ever holds a `Reporter`.
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    Log {
        level: Level,
        message: String,
    },

    /// An item moved from Pending to Running.
    ItemStarted {
        index: usize,
        total: usize,
        name: String,
    },

    /// Encode progress for the running item (already throttled by the runner).
    Progress {
        name: String,
        time: String,
    },

    ItemSucceeded {
        name: String,
    },

    ItemFailed {
        name: String,
        error: String,
    },

    BatchFinished {
        succeeded: usize,
        failed: usize,
    },
}

/// Cloneable sending half of the event channel.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: Sender<Event>,
}

impl Reporter {
    /// Create a reporter plus the receiver an observer drains.
    pub fn channel() -> (Self, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Reporter with no observer; every event is dropped.
    pub fn sink() -> Self {
        let (tx, _rx) = mpsc::channel();
        Self { tx }
    }

    pub fn send(&self, event: Event) {
        // A gone observer is not the engine's problem
        let _ = self.tx.send(event);
    }

    /// Narrow log-sink interface: emit one levelled line.
    pub fn emit(&self, level: Level, message: impl Into<String>) {
        self.send(Event::Log {
            level,
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Level::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(Level::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Level::Error, message);
    }
}
