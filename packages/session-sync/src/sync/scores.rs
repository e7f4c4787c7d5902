use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::GameBoard;
use crate::error::SyncError;
use crate::presenter::GamePresenter;
use crate::relay::{keys, PropertyMap, PropertyValue, SessionRelay};
use crate::sync::guard::EchoGuard;

/// Reconciles the board's scoreboard with the `score:<name>` room keys.
///
/// Remote values overwrite, never merge: the bag is the single source of
/// truth for scores, and a series the local board has never seen is simply
/// created on first sight.
pub struct ScoreReplicator {
    relay: Arc<dyn SessionRelay>,
    presenter: Arc<dyn GamePresenter>,
    board: Option<Arc<GameBoard>>,
    applying_remote: AtomicBool,
}

impl ScoreReplicator {
    pub fn new(
        relay: Arc<dyn SessionRelay>,
        board: Option<Arc<GameBoard>>,
        presenter: Arc<dyn GamePresenter>,
    ) -> Self {
        if board.is_none() {
            warn!("no game board attached, score replication disabled");
        }
        Self {
            relay,
            presenter,
            board,
            applying_remote: AtomicBool::new(false),
        }
    }

    /// Overwrites the local entry and replicates it to the bag.
    ///
    /// The local overwrite happens even outside a session (offline play
    /// keeps its scoreboard); only the bag write is skipped then.
    pub fn set_local_score(&self, name: &str, value: i64) {
        if EchoGuard::is_engaged(&self.applying_remote) {
            debug!(score = name, "score write during remote apply, suppressed");
            return;
        }
        let Some(board) = &self.board else {
            debug!(error = %SyncError::BoardDetached, score = name, "score write dropped");
            return;
        };
        let previous = board.set_score(name, value);
        if previous != Some(value) {
            self.presenter.on_score_changed(name, value);
        }
        if !self.relay.is_in_session() {
            debug!(error = %SyncError::NotInSession, score = name, "score kept local only");
            return;
        }
        self.relay.set_room_properties(PropertyMap::from([(
            keys::score_key(name),
            PropertyValue::Int(value),
        )]));
    }

    pub fn on_room_properties_changed(&self, changed: &PropertyMap) {
        self.apply_entries(changed);
    }

    /// Late-join hydration: applies every score series already committed to
    /// the bag, however many there are.
    pub fn on_joined_session(&self) {
        let snapshot = self.relay.room_properties();
        let applied = self.apply_entries(&snapshot);
        if applied > 0 {
            info!(series = applied, "hydrated scores from session snapshot");
        }
    }

    /// Pushes every locally known series into the bag as one batched write,
    /// seeding the shared state for subsequent joiners. Called by whichever
    /// member determines it is the first occupant of a fresh session.
    pub fn initialize_session_scores(&self) {
        let Some(board) = &self.board else {
            debug!(error = %SyncError::BoardDetached, "session score seeding dropped");
            return;
        };
        if !self.relay.is_in_session() {
            debug!(error = %SyncError::NotInSession, "session score seeding dropped");
            return;
        }
        let scores = board.scores();
        if scores.is_empty() {
            return;
        }
        info!(series = scores.len(), "seeding session scores");
        let batch: PropertyMap = scores
            .into_iter()
            .map(|(name, value)| (keys::score_key(&name), PropertyValue::Int(value)))
            .collect();
        self.relay.set_room_properties(batch);
    }

    /// Applies every `score:`-prefixed entry of `changed`, one by one; a
    /// malformed value skips that key only. Returns how many were applied.
    fn apply_entries(&self, changed: &PropertyMap) -> usize {
        if EchoGuard::is_engaged(&self.applying_remote) {
            debug!("reentrant remote apply, skipped");
            return 0;
        }
        let Some(board) = &self.board else {
            debug!(error = %SyncError::BoardDetached, "remote scores dropped");
            return 0;
        };
        let mut applied = 0usize;
        for (key, value) in changed {
            let Some(name) = keys::score_name(key) else {
                continue;
            };
            let Some(value) = value.as_int() else {
                let err = SyncError::MalformedValue {
                    key: key.clone(),
                    detail: "expected integer score".to_string(),
                };
                warn!(error = %err, "ignoring bad score value");
                continue;
            };
            applied += 1;
            let previous = board.set_score(name, value);
            if previous == Some(value) {
                // our own echo, or a duplicate delivery
                continue;
            }
            let _guard = EchoGuard::engage(&self.applying_remote);
            self.presenter.on_score_changed(name, value);
        }
        applied
    }
}
