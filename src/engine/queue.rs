// src/engine/queue.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{ChangeEvent, ChangeKind};

/// Changes waiting for the next archive pass, coalesced by key.
///
/// Semantics:
/// - Each key holds exactly one kind: the most recent one observed since the
///   last drain (`add` then `unlink` leaves `unlink`).
/// - Arrival order across keys is not tracked; the archive result does not
///   depend on it.
/// - The archiver consumes entries one at a time with [`PendingQueue::pop`],
///   so whatever it has not reached yet is still here if the pass aborts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    entries: BTreeMap<String, ChangeKind>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change, replacing any earlier kind for the same key.
    pub fn upsert(&mut self, event: ChangeEvent) {
        if let Some(previous) = self.entries.insert(event.key.clone(), event.kind) {
            debug!(
                key = %event.key,
                %previous,
                latest = %event.kind,
                "coalesced pending change",
            );
        }
    }

    /// Remove and return one pending change.
    pub fn pop(&mut self) -> Option<ChangeEvent> {
        self.entries
            .pop_first()
            .map(|(key, kind)| ChangeEvent { key, kind })
    }

    /// Take every pending change, leaving the queue empty.
    pub fn take(&mut self) -> PendingQueue {
        std::mem::take(self)
    }

    /// Put back changes a failed pass did not get to.
    ///
    /// Entries recorded since the pass started are newer, so they win.
    pub fn restore(&mut self, leftover: PendingQueue) {
        for (key, kind) in leftover.entries {
            self.entries.entry(key).or_insert(kind);
        }
    }

    pub fn get(&self, key: &str) -> Option<ChangeKind> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ChangeKind> + '_ {
        self.entries.values().copied()
    }
}

impl FromIterator<ChangeEvent> for PendingQueue {
    fn from_iter<I: IntoIterator<Item = ChangeEvent>>(iter: I) -> Self {
        let mut queue = PendingQueue::new();
        for event in iter {
            queue.upsert(event);
        }
        queue
    }
}
