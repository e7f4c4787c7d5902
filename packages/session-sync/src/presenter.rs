//! Post-update notification seam toward the presentation layer.

use crate::domain::phase::Phase;
use crate::relay::Member;

/// Callbacks invoked after each successful local application of a replicated
/// change, so screens can re-render.
///
/// Implementations may call back into the replication components; the
/// per-component reentrancy guards keep that from looping a remote apply
/// back into a new bag write.
pub trait GamePresenter: Send + Sync {
    fn on_phase_changed(&self, phase: Phase);
    fn on_score_changed(&self, name: &str, value: i64);
    fn on_owner_changed(&self, owner: Option<Member>);
}

/// Presenter that ignores every notification (headless sessions, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl GamePresenter for NullPresenter {
    fn on_phase_changed(&self, _phase: Phase) {}
    fn on_score_changed(&self, _name: &str, _value: i64) {}
    fn on_owner_changed(&self, _owner: Option<Member>) {}
}
