// src/engine/mod.rs

//! Orchestration engine for ulos.
//!
//! This module ties together:
//! - the pending-change queue (coalescing by key)
//! - the debounce / processing state machine
//! - the upload cycle (archive, compare, upload) and its retry loop
//!
//! The pure core state machine lives in [`core`] and [`event_handlers`]; the
//! async/IO shell that owns timers and the in-flight cycle is implemented in
//! [`runtime`]; the cycle itself is in [`cycle`].

use std::time::Duration;

use crate::types::{ChangeEvent, ChangeKind};

/// Per-kind settle delays applied before a cycle starts.
///
/// Saves tend to fire bursts of `Modified` events, while additions and
/// removals benefit from waiting for companion events, hence the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayConfig {
    pub add: Duration,
    pub change: Duration,
    pub unlink: Duration,
}

impl DelayConfig {
    pub fn for_kind(&self, kind: ChangeKind) -> Duration {
        match kind {
            ChangeKind::Added => self.add,
            ChangeKind::Modified => self.change,
            ChangeKind::Removed => self.unlink,
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            add: Duration::from_millis(1000),
            change: Duration::ZERO,
            unlink: Duration::from_millis(1000),
        }
    }
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Pause between a busy/conflict response (or a drain of changes that
    /// arrived mid-upload) and the next cycle. There is no retry limit.
    pub retry_interval: Duration,
    /// If true, fatal upload errors are published as
    /// [`PipelineStatus::Failed`](crate::types::PipelineStatus::Failed) and the
    /// pipeline keeps watching; otherwise the runtime returns the error.
    pub keep_watching_on_error: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(2),
            keep_watching_on_error: false,
        }
    }
}

/// Events flowing into the pipeline from the watcher, priming and signals.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A file under the watch root changed.
    FileChanged(ChangeEvent),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// How a single archive + upload cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The archive matched what the endpoint already has; nothing was sent.
    Unchanged,
    /// The endpoint reported a concurrent update; try again later.
    Busy,
    /// The endpoint accepted the package.
    Uploaded { code_size: u64 },
    /// The cycle hit a fatal error, reported separately by the shell.
    Failed,
}

pub mod core;
pub mod cycle;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use self::core::{Phase, QueueCore};
pub use cycle::UploadCycle;
pub use event_handlers::{CoreCommand, CoreInput, CoreStep};
pub use queue::PendingQueue;
pub use runtime::QueueManager;
