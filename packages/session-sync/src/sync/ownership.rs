use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::presenter::GamePresenter;
use crate::relay::{keys, Member, MemberId, PropertyMap, PropertyValue, SessionRelay};

/// Enforces the at-most-one product-owner invariant over the per-member
/// `isOwner` flags.
///
/// The election is optimistic, not linearizable: two members claiming at
/// nearly the same instant can both momentarily believe they succeeded.
/// Every member's instance runs the same defensive clearing in
/// [`on_member_properties_changed`](Self::on_member_properties_changed), so
/// the session converges on whichever claim the relay committed last.
/// Claims are rare, human-paced events, which makes that trade acceptable.
pub struct OwnerElection {
    relay: Arc<dyn SessionRelay>,
    presenter: Arc<dyn GamePresenter>,
    /// Edge detection for presenter notifications only; every ownership
    /// decision re-reads the roster.
    last_notified: Mutex<Option<MemberId>>,
}

impl OwnerElection {
    pub fn new(relay: Arc<dyn SessionRelay>, presenter: Arc<dyn GamePresenter>) -> Self {
        Self {
            relay,
            presenter,
            last_notified: Mutex::new(None),
        }
    }

    /// True if `member` currently holds the owner flag.
    pub fn is_owner(&self, member: MemberId) -> bool {
        self.relay
            .member_properties(member)
            .get(keys::IS_OWNER)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }

    pub fn is_local_owner(&self) -> bool {
        self.relay
            .local_member()
            .is_some_and(|member| self.is_owner(member.id))
    }

    /// First flagged member in roster order, or `None`.
    ///
    /// Queried fresh on every call: rosters are a handful of members, and a
    /// linear scan beats a cache that can go stale mid-election.
    pub fn current_owner(&self) -> Option<Member> {
        self.relay
            .session_members()
            .into_iter()
            .find(|member| self.is_owner(member.id))
    }

    /// Claims the owner role for the local member, unless someone already
    /// holds it or the caller is not in a session.
    pub fn claim_ownership(&self) {
        if !self.relay.is_in_session() {
            debug!(error = %SyncError::NotInSession, "ownership claim dropped");
            return;
        }
        if let Some(owner) = self.current_owner() {
            debug!(owner_id = owner.id, "ownership claim dropped, owner exists");
            return;
        }
        let Some(local) = self.relay.local_member() else {
            return;
        };
        info!(member_id = local.id, "claiming ownership");
        self.relay.set_member_properties(
            local.id,
            PropertyMap::from([(keys::IS_OWNER.to_string(), PropertyValue::Bool(true))]),
        );
    }

    /// Clears the local member's flag if held.
    pub fn relinquish_ownership(&self) {
        let Some(local) = self.relay.local_member() else {
            return;
        };
        if !self.is_owner(local.id) {
            return;
        }
        info!(member_id = local.id, "relinquishing ownership");
        self.relay.set_member_properties(
            local.id,
            PropertyMap::from([(keys::IS_OWNER.to_string(), PropertyValue::Bool(false))]),
        );
    }

    pub fn on_member_properties_changed(&self, member: &Member, changed: &PropertyMap) {
        let Some(value) = changed.get(keys::IS_OWNER) else {
            return;
        };
        match value.as_bool() {
            Some(true) => self.enforce_single_owner(member),
            Some(false) => {}
            None => {
                let err = SyncError::MalformedValue {
                    key: keys::IS_OWNER.to_string(),
                    detail: format!("expected bool, got {value:?}"),
                };
                warn!(error = %err, member_id = member.id, "ignoring bad owner flag");
                return;
            }
        }
        self.notify_if_owner_changed();
    }

    /// Owner display after joining a session that may already have one.
    pub fn on_joined_session(&self) {
        self.notify_if_owner_changed();
    }

    /// No property cleanup: the roster scan no longer finds the departed
    /// member, so `current_owner` self-heals. Only the notification remains.
    pub fn on_member_left(&self, member: &Member) {
        debug!(member_id = member.id, "member left");
        self.notify_if_owner_changed();
    }

    /// Clears every *other* member currently holding the flag. At most one
    /// should exist, but a transient double-claim can leave several, so all
    /// of them are cleared rather than trusting the invariant.
    fn enforce_single_owner(&self, claimant: &Member) {
        for other in self.relay.session_members() {
            if other.id != claimant.id && self.is_owner(other.id) {
                info!(
                    claimant_id = claimant.id,
                    cleared_id = other.id,
                    "clearing stale owner flag"
                );
                self.relay.set_member_properties(
                    other.id,
                    PropertyMap::from([(keys::IS_OWNER.to_string(), PropertyValue::Bool(false))]),
                );
            }
        }
    }

    fn notify_if_owner_changed(&self) {
        let current = self.current_owner();
        let current_id = current.as_ref().map(|member| member.id);
        {
            let mut last = self.last_notified.lock();
            if *last == current_id {
                return;
            }
            *last = current_id;
        }
        self.presenter.on_owner_changed(current);
    }
}
