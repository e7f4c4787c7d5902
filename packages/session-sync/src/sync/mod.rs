//! Replication components and the session-facing facade.

mod guard;
pub mod ownership;
pub mod scores;
pub mod state;

#[cfg(test)]
mod tests_props_convergence;

// Re-exports for ergonomics
pub use ownership::OwnerElection;
pub use scores::ScoreReplicator;
pub use state::StateReplicator;

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::GameBoard;
use crate::presenter::GamePresenter;
use crate::relay::{Member, PropertyMap, RelayObserver, SessionRelay};

/// Wires the three replication components behind one relay listener
/// registration.
///
/// Register an `Arc<SessionSync>` as the relay adapter's observer and call
/// the components through the accessors; the facade routes each relay event
/// to the components that consume it.
pub struct SessionSync {
    relay: Arc<dyn SessionRelay>,
    state: StateReplicator,
    scores: ScoreReplicator,
    ownership: OwnerElection,
}

impl SessionSync {
    pub fn new(
        relay: Arc<dyn SessionRelay>,
        board: Arc<GameBoard>,
        presenter: Arc<dyn GamePresenter>,
    ) -> Self {
        Self::build(relay, Some(board), presenter)
    }

    /// Degraded construction for contexts without a game board: phase and
    /// score replication are disabled (logged no-ops), ownership still
    /// works.
    pub fn without_board(relay: Arc<dyn SessionRelay>, presenter: Arc<dyn GamePresenter>) -> Self {
        Self::build(relay, None, presenter)
    }

    fn build(
        relay: Arc<dyn SessionRelay>,
        board: Option<Arc<GameBoard>>,
        presenter: Arc<dyn GamePresenter>,
    ) -> Self {
        Self {
            state: StateReplicator::new(relay.clone(), board.clone(), presenter.clone()),
            scores: ScoreReplicator::new(relay.clone(), board, presenter.clone()),
            ownership: OwnerElection::new(relay.clone(), presenter),
            relay,
        }
    }

    pub fn state(&self) -> &StateReplicator {
        &self.state
    }

    pub fn scores(&self) -> &ScoreReplicator {
        &self.scores
    }

    pub fn ownership(&self) -> &OwnerElection {
        &self.ownership
    }
}

impl RelayObserver for SessionSync {
    fn on_joined_session(&self) {
        self.state.on_joined_session();
        if self.relay.is_coordinator() && self.relay.session_members().len() <= 1 {
            info!("first occupant of a fresh session");
            self.scores.initialize_session_scores();
        } else {
            self.scores.on_joined_session();
        }
        self.ownership.on_joined_session();
    }

    fn on_left_session(&self) {
        info!("left session");
    }

    fn on_room_properties_changed(&self, changed: &PropertyMap) {
        self.state.on_room_properties_changed(changed);
        self.scores.on_room_properties_changed(changed);
    }

    fn on_member_properties_changed(&self, member: &Member, changed: &PropertyMap) {
        self.ownership.on_member_properties_changed(member, changed);
    }

    fn on_member_joined(&self, member: &Member) {
        debug!(member_id = member.id, "member joined");
    }

    fn on_member_left(&self, member: &Member) {
        self.ownership.on_member_left(member);
    }

    fn on_coordinator_changed(&self, member: &Member) {
        debug!(member_id = member.id, "coordinator changed");
    }
}
