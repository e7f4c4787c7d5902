use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::domain::phase::Phase;

/// Gameplay-owned local mirror of the replicated session state.
///
/// Holds the phase value and an open-ended scoreboard. The replication
/// components are the only writers during a session; gameplay and
/// presentation code read it freely. Reads never touch the network.
///
/// The scoreboard has no fixed schema: its key set is whatever has ever been
/// seen locally or remotely. Reads of unknown names return `None`, writes of
/// new names insert.
#[derive(Debug, Default)]
pub struct GameBoard {
    phase: Mutex<Phase>,
    scores: Mutex<BTreeMap<String, i64>>,
}

impl GameBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        *self.phase.lock() = phase;
    }

    /// Score for `name`, or `None` if the series has never been seen.
    pub fn score(&self, name: &str) -> Option<i64> {
        self.scores.lock().get(name).copied()
    }

    /// Snapshot of every known score series.
    pub fn scores(&self) -> BTreeMap<String, i64> {
        self.scores.lock().clone()
    }

    /// Populates a score series before a session exists, e.g. from a saved
    /// local game. Once in a session, mutate through
    /// [`ScoreReplicator::set_local_score`](crate::sync::ScoreReplicator::set_local_score)
    /// so the change replicates.
    pub fn seed_score(&self, name: &str, value: i64) {
        self.set_score(name, value);
    }

    /// Overwrites `name`, inserting it on first write. Returns the previous
    /// value.
    pub(crate) fn set_score(&self, name: &str, value: i64) -> Option<i64> {
        self.scores.lock().insert(name.to_string(), value)
    }
}
