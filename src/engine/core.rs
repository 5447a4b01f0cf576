// src/engine/core.rs

//! Pure core queue state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`CoreInput`]s and produces:
//! - an updated core state (pending queue + debounce state)
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::QueueManager`) is responsible for:
//! - reading events from channels
//! - owning the single pending timer and the in-flight cycle
//! - handling shutdown
//!
//! The core is intended to be unit tested without Tokio, channels,
//! filesystem or network.

use std::time::Duration;

use crate::engine::event_handlers::{
    CoreInput, CoreStep, handle_change, handle_cycle_finished, handle_timer,
};
use crate::engine::queue::PendingQueue;
use crate::engine::{DelayConfig, RuntimeOptions};

/// Where the pipeline is in its debounce / upload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No timer pending, no cycle running.
    Idle,
    /// A debounce timer is pending; changes keep accumulating.
    Debouncing,
    /// A cycle is running, or waiting on its retry timer.
    Processing,
}

/// Debounce bookkeeping owned by the core.
#[derive(Debug, Clone)]
pub struct DebounceState {
    pub phase: Phase,
    /// Delay of the pending debounce timer. Only ever raised while
    /// debouncing; reset after a successful upload.
    pub delay: Duration,
    /// Size of an accepted package whose success has not been published
    /// yet, because changes were still queued when it was accepted.
    pub unreported_upload: Option<u64>,
}

impl Default for DebounceState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            delay: Duration::ZERO,
            unreported_upload: None,
        }
    }
}

/// Pure core state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct QueueCore {
    queue: PendingQueue,
    debounce: DebounceState,
    delays: DelayConfig,
    retry_interval: Duration,
}

impl QueueCore {
    pub fn new(delays: DelayConfig, options: RuntimeOptions) -> Self {
        Self {
            queue: PendingQueue::new(),
            debounce: DebounceState::default(),
            delays,
            retry_interval: options.retry_interval,
        }
    }

    pub fn phase(&self) -> Phase {
        self.debounce.phase
    }

    /// Delay the next debounce timer will use.
    pub fn current_delay(&self) -> Duration {
        self.debounce.delay
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.queue
    }

    /// True when nothing is queued, scheduled or running.
    pub fn is_idle(&self) -> bool {
        self.debounce.phase == Phase::Idle && self.queue.is_empty()
    }

    /// Handle a single input, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, input: CoreInput) -> CoreStep {
        match input {
            CoreInput::Changed(event) => {
                handle_change(&mut self.queue, &mut self.debounce, &self.delays, event)
            }
            CoreInput::TimerElapsed => handle_timer(&mut self.queue, &mut self.debounce),
            CoreInput::CycleFinished { outcome, leftover } => handle_cycle_finished(
                &mut self.queue,
                &mut self.debounce,
                &self.delays,
                self.retry_interval,
                outcome,
                leftover,
            ),
        }
    }
}
