// src/watch/events.rs

//! Classification of raw `notify` events into pipeline change kinds.

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RenameMode};

use crate::types::ChangeKind;

/// What a path looked like on disk when its event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    File,
    Dir,
    Missing,
}

/// What the watcher should do with one path of a `notify` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// Forward a single change for this path.
    Change(ChangeKind),
    /// A directory appeared; every file below it must be reported as added,
    /// since the platform watcher does not replay its contents.
    ScanDir,
}

/// Classify path number `index` of an event of the given kind.
///
/// Returns `None` for events that cannot change package contents (access,
/// metadata, directory modifications).
pub fn classify(kind: &EventKind, index: usize, state: PathState) -> Option<Classified> {
    match kind {
        EventKind::Access(_) | EventKind::Other => None,
        EventKind::Modify(ModifyKind::Metadata(_)) => None,

        EventKind::Create(CreateKind::Folder) => match state {
            PathState::Dir => Some(Classified::ScanDir),
            _ => None,
        },
        EventKind::Create(_) => from_state(state, ChangeKind::Added),

        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            Some(Classified::Change(ChangeKind::Removed))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            from_state(state, ChangeKind::Added)
        }
        // Both: paths[0] is the old name, paths[1] the new one.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if index == 0 => {
            Some(Classified::Change(ChangeKind::Removed))
        }
        EventKind::Modify(ModifyKind::Name(_)) => from_state(state, ChangeKind::Added),

        EventKind::Modify(_) => match state {
            PathState::File => Some(Classified::Change(ChangeKind::Modified)),
            PathState::Dir => None,
            PathState::Missing => Some(Classified::Change(ChangeKind::Removed)),
        },

        EventKind::Remove(_) => Some(Classified::Change(ChangeKind::Removed)),

        EventKind::Any => from_state(state, ChangeKind::Modified),
    }
}

/// Resolve an ambiguous event by looking at the path itself.
fn from_state(state: PathState, present: ChangeKind) -> Option<Classified> {
    match state {
        PathState::File => Some(Classified::Change(present)),
        PathState::Dir => Some(Classified::ScanDir),
        PathState::Missing => Some(Classified::Change(ChangeKind::Removed)),
    }
}
