// tests/core_state_machine.rs

use std::time::Duration;

use ulos::engine::{
    CoreCommand, CoreInput, CycleOutcome, DelayConfig, PendingQueue, Phase, QueueCore,
    RuntimeOptions,
};
use ulos::types::{ChangeEvent, ChangeKind, PipelineStatus};

fn new_core() -> QueueCore {
    QueueCore::new(DelayConfig::default(), RuntimeOptions::default())
}

fn change(key: &str, kind: ChangeKind) -> CoreInput {
    CoreInput::Changed(ChangeEvent::new(key, kind))
}

fn finished(outcome: CycleOutcome) -> CoreInput {
    CoreInput::CycleFinished {
        outcome,
        leftover: PendingQueue::new(),
    }
}

fn scheduled(commands: &[CoreCommand]) -> Option<Duration> {
    commands.iter().find_map(|c| match c {
        CoreCommand::ScheduleTimer(d) => Some(*d),
        _ => None,
    })
}

fn started_batch(commands: &[CoreCommand]) -> Option<PendingQueue> {
    commands.iter().find_map(|c| match c {
        CoreCommand::StartCycle(batch) => Some(batch.clone()),
        _ => None,
    })
}

#[test]
fn first_change_schedules_its_kind_delay() {
    let mut core = new_core();

    let step = core.step(change("index.js", ChangeKind::Modified));
    assert_eq!(scheduled(&step.commands), Some(Duration::ZERO));
    assert_eq!(core.phase(), Phase::Debouncing);

    let mut core = new_core();
    let step = core.step(change("index.js", ChangeKind::Added));
    assert_eq!(scheduled(&step.commands), Some(Duration::from_millis(1000)));
}

#[test]
fn debounce_delay_never_shrinks() {
    let mut core = new_core();

    core.step(change("a.js", ChangeKind::Added));
    let step = core.step(change("b.js", ChangeKind::Modified));

    // A later change with a shorter delay still resets to the larger one.
    assert_eq!(scheduled(&step.commands), Some(Duration::from_millis(1000)));
    assert_eq!(core.current_delay(), Duration::from_millis(1000));
}

#[test]
fn timer_starts_cycle_with_whole_queue() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Added));
    core.step(change("b.js", ChangeKind::Removed));

    let step = core.step(CoreInput::TimerElapsed);
    let batch = started_batch(&step.commands).expect("cycle should start");

    assert_eq!(batch.len(), 2);
    assert!(core.pending().is_empty());
    assert_eq!(core.phase(), Phase::Processing);
}

#[test]
fn changes_during_processing_only_queue() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Modified));
    core.step(CoreInput::TimerElapsed);

    let step = core.step(change("b.js", ChangeKind::Modified));

    assert!(step.commands.is_empty());
    assert_eq!(core.pending().get("b.js"), Some(ChangeKind::Modified));
}

#[test]
fn busy_retries_after_interval() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Modified));
    core.step(CoreInput::TimerElapsed);

    let step = core.step(finished(CycleOutcome::Busy));
    assert_eq!(scheduled(&step.commands), Some(Duration::from_secs(2)));
    assert_eq!(core.phase(), Phase::Processing);

    // The retry timer starts another cycle even with nothing queued.
    let step = core.step(CoreInput::TimerElapsed);
    assert!(started_batch(&step.commands).is_some());
}

#[test]
fn upload_with_nothing_pending_publishes_and_resets() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Added));
    core.step(CoreInput::TimerElapsed);

    let step = core.step(finished(CycleOutcome::Uploaded { code_size: 256 }));

    assert!(matches!(
        step.commands.as_slice(),
        [CoreCommand::Publish(PipelineStatus::Uploaded { code_size: 256 })]
    ));
    assert_eq!(core.phase(), Phase::Idle);
    assert_eq!(core.current_delay(), Duration::ZERO);
    assert!(core.is_idle());
}

#[test]
fn upload_with_pending_changes_drains_after_interval() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Added));
    core.step(CoreInput::TimerElapsed);
    core.step(change("b.js", ChangeKind::Modified));

    let step = core.step(finished(CycleOutcome::Uploaded { code_size: 10 }));

    assert_eq!(scheduled(&step.commands), Some(Duration::from_secs(2)));
    assert!(
        !step
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::Publish(_)))
    );
}

#[test]
fn held_back_upload_is_published_when_follow_up_is_unchanged() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Added));
    core.step(CoreInput::TimerElapsed);
    // Touched during the upload, content identical afterwards.
    core.step(change("b.js", ChangeKind::Modified));
    core.step(finished(CycleOutcome::Uploaded { code_size: 10 }));

    let step = core.step(CoreInput::TimerElapsed);
    assert!(started_batch(&step.commands).is_some());

    let step = core.step(finished(CycleOutcome::Unchanged));

    assert!(matches!(
        step.commands.as_slice(),
        [CoreCommand::Publish(PipelineStatus::Uploaded { code_size: 10 })]
    ));
    assert_eq!(core.current_delay(), Duration::ZERO);
    assert!(core.is_idle());

    // Reported once only.
    core.step(change("c.js", ChangeKind::Modified));
    core.step(CoreInput::TimerElapsed);
    let step = core.step(finished(CycleOutcome::Unchanged));
    assert!(step.commands.is_empty());
}

#[test]
fn failed_follow_up_drops_the_held_back_upload() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Added));
    core.step(CoreInput::TimerElapsed);
    core.step(change("b.js", ChangeKind::Modified));
    core.step(finished(CycleOutcome::Uploaded { code_size: 10 }));
    core.step(CoreInput::TimerElapsed);

    core.step(finished(CycleOutcome::Failed));
    core.step(change("c.js", ChangeKind::Modified));
    core.step(CoreInput::TimerElapsed);
    let step = core.step(finished(CycleOutcome::Unchanged));

    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn unchanged_cycle_goes_idle() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Modified));
    core.step(CoreInput::TimerElapsed);

    let step = core.step(finished(CycleOutcome::Unchanged));

    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn unchanged_cycle_rearms_for_changes_queued_meanwhile() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Modified));
    core.step(CoreInput::TimerElapsed);
    core.step(change("b.js", ChangeKind::Added));

    let step = core.step(finished(CycleOutcome::Unchanged));

    assert_eq!(scheduled(&step.commands), Some(Duration::from_millis(1000)));
    assert_eq!(core.phase(), Phase::Debouncing);
}

#[test]
fn failed_cycle_restores_leftovers_and_waits_at_least_retry_interval() {
    let mut core = new_core();
    core.step(change("a.js", ChangeKind::Modified));
    core.step(CoreInput::TimerElapsed);
    core.step(change("b.js", ChangeKind::Removed));

    let leftover: PendingQueue = [
        ChangeEvent::new("a.js", ChangeKind::Modified),
        ChangeEvent::new("b.js", ChangeKind::Added),
    ]
    .into_iter()
    .collect();
    let step = core.step(CoreInput::CycleFinished {
        outcome: CycleOutcome::Failed,
        leftover,
    });

    assert_eq!(core.pending().get("a.js"), Some(ChangeKind::Modified));
    // Queued during the cycle, so newer than the leftover.
    assert_eq!(core.pending().get("b.js"), Some(ChangeKind::Removed));
    assert_eq!(scheduled(&step.commands), Some(Duration::from_secs(2)));
}

#[test]
fn stale_timer_while_idle_is_ignored() {
    let mut core = new_core();
    let step = core.step(CoreInput::TimerElapsed);
    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}
