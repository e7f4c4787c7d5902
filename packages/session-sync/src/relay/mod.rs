//! Relay-adapter seam.
//!
//! The core consumes a third-party real-time relay through [`SessionRelay`]
//! (outbound: membership and property-bag reads/writes) and receives its
//! events through [`RelayObserver`] (inbound capability set). The relay owns
//! the session, the roster, and both property bags; this crate only mirrors
//! them.
//!
//! Delivery contract assumed from the relay: at-least-once, eventually
//! consistent, per-key last-write-wins, and per-member in-order delivery of
//! committed changes. Writes are fire-and-forget; their effect becomes
//! visible only through a later change notification, including to the
//! writer itself (the echo).

pub mod keys;
pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relay-assigned member identifier, stable for the lifetime of a session.
pub type MemberId = i64;

/// One participant in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

/// Value stored under a bag key. The relay replicates these verbatim,
/// last-write-wins per key; it never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// Key/value mapping replicated by the relay, room- or member-scoped.
///
/// Sorted map so hydration and batched writes iterate deterministically.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Outbound contract toward the relay service.
///
/// Reads return the caller's current replicated snapshot, not a fresh
/// round-trip; writes are fire-and-forget. Any member may write any
/// room-scoped key. A foreign member-scoped write is routed by the relay to
/// that member's own client through the change broadcast.
pub trait SessionRelay: Send + Sync {
    fn is_in_session(&self) -> bool;
    fn local_member(&self) -> Option<Member>;
    /// Roster in join order.
    fn session_members(&self) -> Vec<Member>;
    /// Whether the local member is the relay-designated coordinator.
    fn is_coordinator(&self) -> bool;
    fn room_properties(&self) -> PropertyMap;
    fn set_room_properties(&self, changes: PropertyMap);
    fn member_properties(&self, member: MemberId) -> PropertyMap;
    fn set_member_properties(&self, member: MemberId, changes: PropertyMap);
}

/// Inbound capability set invoked by the relay adapter's event dispatch.
///
/// Every method defaults to a no-op, so a listener implements only what it
/// consumes. Handlers receive the subset of keys that changed in one
/// notification and must tolerate seeing only part of a logically related
/// update.
pub trait RelayObserver: Send + Sync {
    fn on_joined_session(&self) {}
    fn on_left_session(&self) {}
    fn on_room_properties_changed(&self, _changed: &PropertyMap) {}
    fn on_member_properties_changed(&self, _member: &Member, _changed: &PropertyMap) {}
    fn on_member_joined(&self, _member: &Member) {}
    fn on_member_left(&self, _member: &Member) {}
    fn on_coordinator_changed(&self, _member: &Member) {}
}
