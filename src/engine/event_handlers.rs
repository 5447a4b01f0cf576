// src/engine/event_handlers.rs

//! Event handling logic for the core queue state machine.

use std::time::Duration;

use tracing::debug;

use crate::engine::core::{DebounceState, Phase};
use crate::engine::queue::PendingQueue;
use crate::engine::{CycleOutcome, DelayConfig};
use crate::types::{ChangeEvent, PipelineStatus};

/// Inputs consumed by the pure core.
#[derive(Debug, Clone)]
pub enum CoreInput {
    /// A normalized change arrived from the watch source.
    Changed(ChangeEvent),
    /// The single pending timer (debounce or retry) fired.
    TimerElapsed,
    /// The in-flight cycle finished. `leftover` holds changes the cycle
    /// did not get to (only non-empty when it failed part-way).
    CycleFinished {
        outcome: CycleOutcome,
        leftover: PendingQueue,
    },
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Cancel any pending timer and start a new one with this delay.
    ScheduleTimer(Duration),
    /// Run one archive + upload cycle over this batch.
    StartCycle(PendingQueue),
    /// Forward a status to the presentation layer.
    Publish(PipelineStatus),
}

/// Decision returned by the core after handling a single [`CoreInput`].
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
}

impl CoreStep {
    fn none() -> Self {
        Self::default()
    }

    fn one(command: CoreCommand) -> Self {
        Self {
            commands: vec![command],
        }
    }
}

/// Handle a change from the watch source.
///
/// - The change always lands in the queue (last kind wins).
/// - While a cycle is processing nothing else happens; the cycle picks the
///   change up when it finishes.
/// - Otherwise the delay grows to this kind's delay if that is longer, and
///   the debounce timer is replaced.
pub fn handle_change(
    queue: &mut PendingQueue,
    debounce: &mut DebounceState,
    delays: &DelayConfig,
    event: ChangeEvent,
) -> CoreStep {
    let kind = event.kind;
    queue.upsert(event);

    if debounce.phase == Phase::Processing {
        debug!(pending = queue.len(), "change deferred until the running cycle ends");
        return CoreStep::none();
    }

    debounce.delay = debounce.delay.max(delays.for_kind(kind));
    debounce.phase = Phase::Debouncing;

    debug!(delay_ms = debounce.delay.as_millis() as u64, "debounce timer reset");
    CoreStep::one(CoreCommand::ScheduleTimer(debounce.delay))
}

/// Handle the pending timer firing: start a cycle over everything queued.
///
/// The same timer slot serves the debounce wait and the retry wait.
pub fn handle_timer(queue: &mut PendingQueue, debounce: &mut DebounceState) -> CoreStep {
    match debounce.phase {
        Phase::Idle => {
            debug!("stale timer ignored while idle");
            CoreStep::none()
        }
        Phase::Debouncing | Phase::Processing => {
            debounce.phase = Phase::Processing;
            CoreStep::one(CoreCommand::StartCycle(queue.take()))
        }
    }
}

/// Handle the end of a cycle.
///
/// - `Busy`: retry after `retry_interval`, indefinitely.
/// - `Uploaded` with changes queued meanwhile: run again after
///   `retry_interval` so they are drained. Success is held back until then.
/// - `Uploaded` with an empty queue: publish success, reset the delay, idle.
/// - `Unchanged`: idle, re-arming the debounce timer if changes arrived while
///   the cycle ran. A held-back success is published once nothing is queued.
/// - `Failed`: as `Unchanged`, but any held-back success is dropped.
pub fn handle_cycle_finished(
    queue: &mut PendingQueue,
    debounce: &mut DebounceState,
    delays: &DelayConfig,
    retry_interval: Duration,
    outcome: CycleOutcome,
    leftover: PendingQueue,
) -> CoreStep {
    queue.restore(leftover);

    match outcome {
        CycleOutcome::Busy => {
            debug!(retry_ms = retry_interval.as_millis() as u64, "endpoint busy; retrying");
            CoreStep::one(CoreCommand::ScheduleTimer(retry_interval))
        }
        CycleOutcome::Uploaded { code_size } if !queue.is_empty() => {
            debug!(pending = queue.len(), "changes arrived during upload; running again");
            debounce.unreported_upload = Some(code_size);
            CoreStep::one(CoreCommand::ScheduleTimer(retry_interval))
        }
        CycleOutcome::Uploaded { code_size } => publish_uploaded(debounce, code_size),
        CycleOutcome::Unchanged => match debounce.unreported_upload {
            Some(code_size) if queue.is_empty() => publish_uploaded(debounce, code_size),
            _ => rearm_if_pending(queue, debounce, delays, Duration::ZERO),
        },
        // Leftovers of a failed cycle may fail again; never retry them
        // faster than the retry interval.
        CycleOutcome::Failed => {
            debounce.delay = Duration::ZERO;
            debounce.unreported_upload = None;
            rearm_if_pending(queue, debounce, delays, retry_interval)
        }
    }
}

fn publish_uploaded(debounce: &mut DebounceState, code_size: u64) -> CoreStep {
    debounce.phase = Phase::Idle;
    debounce.delay = Duration::ZERO;
    debounce.unreported_upload = None;
    CoreStep::one(CoreCommand::Publish(PipelineStatus::Uploaded { code_size }))
}

/// Go idle, unless changes were queued while the cycle ran. Those are not
/// stranded: they get a fresh debounce wait of at least `floor`.
fn rearm_if_pending(
    queue: &PendingQueue,
    debounce: &mut DebounceState,
    delays: &DelayConfig,
    floor: Duration,
) -> CoreStep {
    if queue.is_empty() {
        debounce.phase = Phase::Idle;
        return CoreStep::none();
    }

    let delay = queue
        .kinds()
        .map(|kind| delays.for_kind(kind))
        .fold(debounce.delay, Duration::max)
        .max(floor);
    debounce.delay = delay;
    debounce.phase = Phase::Debouncing;

    CoreStep::one(CoreCommand::ScheduleTimer(delay))
}
