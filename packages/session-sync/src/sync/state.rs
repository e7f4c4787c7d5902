use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{GameBoard, Phase};
use crate::error::SyncError;
use crate::presenter::GamePresenter;
use crate::relay::{keys, PropertyMap, PropertyValue, SessionRelay};
use crate::sync::guard::EchoGuard;

/// Reconciles the board's phase with the room `state` key.
///
/// Local transition requests go out as bag writes and come back as echoed
/// change notifications; only the echo path mutates the board, so every
/// member (the writer included) applies the phase through one code path.
pub struct StateReplicator {
    relay: Arc<dyn SessionRelay>,
    presenter: Arc<dyn GamePresenter>,
    board: Option<Arc<GameBoard>>,
    applying_remote: AtomicBool,
}

impl StateReplicator {
    pub fn new(
        relay: Arc<dyn SessionRelay>,
        board: Option<Arc<GameBoard>>,
        presenter: Arc<dyn GamePresenter>,
    ) -> Self {
        if board.is_none() {
            warn!("no game board attached, phase replication disabled");
        }
        Self {
            relay,
            presenter,
            board,
            applying_remote: AtomicBool::new(false),
        }
    }

    /// Requests a phase transition by writing the room `state` key.
    ///
    /// The board is not touched here; the new phase lands when the relay
    /// echoes the change back. Dropped while a remote apply is in progress
    /// (the requested value already came from the bag) and outside a
    /// session.
    pub fn request_transition(&self, next: Phase) {
        if EchoGuard::is_engaged(&self.applying_remote) {
            debug!(phase = %next, "transition request during remote apply, suppressed");
            return;
        }
        if self.board.is_none() {
            debug!(error = %SyncError::BoardDetached, phase = %next, "transition request dropped");
            return;
        }
        if !self.relay.is_in_session() {
            debug!(error = %SyncError::NotInSession, phase = %next, "transition request dropped");
            return;
        }
        self.relay.set_room_properties(PropertyMap::from([(
            keys::STATE.to_string(),
            PropertyValue::Int(next.code()),
        )]));
    }

    pub fn on_room_properties_changed(&self, changed: &PropertyMap) {
        let Some(value) = changed.get(keys::STATE) else {
            return;
        };
        match decode_phase(value) {
            Ok(phase) => self.apply_remote(phase),
            Err(err) => warn!(error = %err, "ignoring bad state value"),
        }
    }

    /// Late-join hydration: applies the phase already committed to the bag,
    /// if any. Without a `state` entry the board stays at its default.
    pub fn on_joined_session(&self) {
        let snapshot = self.relay.room_properties();
        let Some(value) = snapshot.get(keys::STATE) else {
            return;
        };
        match decode_phase(value) {
            Ok(phase) => {
                info!(phase = %phase, "hydrated phase from session snapshot");
                self.apply_remote(phase);
            }
            Err(err) => warn!(error = %err, "ignoring bad state value in snapshot"),
        }
    }

    fn apply_remote(&self, phase: Phase) {
        if EchoGuard::is_engaged(&self.applying_remote) {
            debug!(phase = %phase, "reentrant remote apply, skipped");
            return;
        }
        let Some(board) = &self.board else {
            debug!(error = %SyncError::BoardDetached, "remote phase dropped");
            return;
        };
        if board.phase() == phase {
            // our own echo, or a duplicate delivery
            return;
        }
        let _guard = EchoGuard::engage(&self.applying_remote);
        board.set_phase(phase);
        self.presenter.on_phase_changed(phase);
    }
}

fn decode_phase(value: &PropertyValue) -> Result<Phase, SyncError> {
    let code = value.as_int().ok_or_else(|| SyncError::MalformedValue {
        key: keys::STATE.to_string(),
        detail: format!("expected integer, got {value:?}"),
    })?;
    Phase::from_code(code).ok_or_else(|| SyncError::MalformedValue {
        key: keys::STATE.to_string(),
        detail: format!("unknown phase code {code}"),
    })
}
