//! In-process relay: one hub per session, one client handle per member.
//!
//! Writes commit to the hub bag immediately under the hub lock, so arrival
//! order at the hub is the last-write-wins order. What each member *sees* is
//! a per-member replicated view that only advances when [`MemoryRelayHub::pump`]
//! delivers the queued change notifications, including to the writer
//! itself. That models the relay's asynchronous echo: a write returns before
//! any member observes it, and two members can act on stale views in the
//! window between commit and delivery.
//!
//! Members joining mid-session snapshot the committed bag, since the relay
//! sends full state on join rather than replaying history.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::relay::{Member, MemberId, PropertyMap, RelayObserver, SessionRelay};

enum Event {
    JoinedSession,
    RoomChanged(PropertyMap),
    MemberChanged(Member, PropertyMap),
    MemberJoined(Member),
    MemberLeft(Member),
    CoordinatorChanged(Member),
}

struct Delivery {
    to: MemberId,
    event: Event,
}

struct ClientState {
    member: Member,
    observer: Arc<dyn RelayObserver>,
    /// This member's replicated view of the room bag.
    room_view: PropertyMap,
    /// This member's replicated view of every member's bag.
    member_views: HashMap<MemberId, PropertyMap>,
}

#[derive(Default)]
struct HubState {
    /// Committed room bag; the source of join snapshots.
    room: PropertyMap,
    /// Committed member bags.
    member_props: HashMap<MemberId, PropertyMap>,
    clients: HashMap<MemberId, ClientState>,
    /// Join order; the scan order every client reports.
    roster: Vec<MemberId>,
    coordinator: Option<MemberId>,
    next_id: MemberId,
    queue: VecDeque<Delivery>,
    writes: u64,
}

/// One session's worth of shared relay state.
pub struct MemoryRelayHub {
    state: Mutex<HubState>,
}

impl MemoryRelayHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HubState::default()),
        })
    }

    /// A client handle that is not yet in the session; call
    /// [`MemoryRelay::join`] to enter.
    pub fn client(self: &Arc<Self>) -> Arc<MemoryRelay> {
        Arc::new(MemoryRelay {
            hub: Arc::clone(self),
            local: Mutex::new(None),
        })
    }

    /// Drains the delivery queue, invoking each recipient's observer.
    ///
    /// Handlers may issue further writes; those enqueue behind and are
    /// drained in the same call. Returns the number of deliveries made.
    pub fn pump(&self) -> usize {
        let mut delivered = 0usize;
        loop {
            let Some((observer, event)) = self.next_delivery() else {
                break;
            };
            dispatch(observer.as_ref(), &event);
            delivered += 1;
        }
        delivered
    }

    /// Total property writes committed so far, for asserting that inbound
    /// echoes trigger no outbound writes.
    pub fn writes_issued(&self) -> u64 {
        self.state.lock().writes
    }

    /// Pops the next deliverable event, merging it into the recipient's
    /// replicated view first so the callback observes a consistent snapshot.
    /// The callback itself runs without the hub lock held.
    fn next_delivery(&self) -> Option<(Arc<dyn RelayObserver>, Event)> {
        let mut hub = self.state.lock();
        while let Some(delivery) = hub.queue.pop_front() {
            let Some(client) = hub.clients.get_mut(&delivery.to) else {
                // recipient left before the queue drained
                continue;
            };
            match &delivery.event {
                Event::RoomChanged(changed) => {
                    for (key, value) in changed {
                        client.room_view.insert(key.clone(), value.clone());
                    }
                }
                Event::MemberChanged(member, changed) => {
                    let view = client.member_views.entry(member.id).or_default();
                    for (key, value) in changed {
                        view.insert(key.clone(), value.clone());
                    }
                }
                Event::MemberLeft(departed) => {
                    client.member_views.remove(&departed.id);
                }
                _ => {}
            }
            let observer = Arc::clone(&client.observer);
            return Some((observer, delivery.event));
        }
        None
    }
}

fn dispatch(observer: &dyn RelayObserver, event: &Event) {
    match event {
        Event::JoinedSession => observer.on_joined_session(),
        Event::RoomChanged(changed) => observer.on_room_properties_changed(changed),
        Event::MemberChanged(member, changed) => {
            observer.on_member_properties_changed(member, changed)
        }
        Event::MemberJoined(member) => observer.on_member_joined(member),
        Event::MemberLeft(member) => observer.on_member_left(member),
        Event::CoordinatorChanged(member) => observer.on_coordinator_changed(member),
    }
}

/// Per-member client handle implementing the relay contract.
pub struct MemoryRelay {
    hub: Arc<MemoryRelayHub>,
    local: Mutex<Option<MemberId>>,
}

impl MemoryRelay {
    /// Enters the session, registering `observer` for event delivery.
    ///
    /// The first member becomes coordinator. The joiner's replicated view
    /// starts as a snapshot of the committed bag; the `on_joined_session`
    /// delivery is queued, not synchronous.
    pub fn join(&self, name: &str, observer: Arc<dyn RelayObserver>) -> MemberId {
        let mut local = self.local.lock();
        if let Some(id) = *local {
            debug!(member_id = id, "join ignored, already in session");
            return id;
        }
        let mut hub = self.hub.state.lock();
        hub.next_id += 1;
        let id = hub.next_id;
        let member = Member {
            id,
            name: name.to_string(),
        };
        hub.member_props.insert(id, PropertyMap::new());
        let client = ClientState {
            member: member.clone(),
            observer,
            room_view: hub.room.clone(),
            member_views: hub.member_props.clone(),
        };
        hub.clients.insert(id, client);
        let others: Vec<MemberId> = hub.roster.clone();
        hub.roster.push(id);
        if hub.coordinator.is_none() {
            hub.coordinator = Some(id);
        }
        hub.queue.push_back(Delivery {
            to: id,
            event: Event::JoinedSession,
        });
        for other in others {
            hub.queue.push_back(Delivery {
                to: other,
                event: Event::MemberJoined(member.clone()),
            });
        }
        drop(hub);
        *local = Some(id);
        id
    }

    /// Leaves the session. The departing member's properties die with it,
    /// the coordinator role moves to the earliest remaining member, and the
    /// leaver's own observer is told synchronously (its connection is gone;
    /// there is nothing left to echo through).
    pub fn leave(&self) {
        let mut local = self.local.lock();
        let Some(id) = local.take() else {
            debug!("leave ignored, not in a session");
            return;
        };
        let mut hub = self.hub.state.lock();
        hub.roster.retain(|&m| m != id);
        hub.member_props.remove(&id);
        let departed = hub.clients.remove(&id);
        let departed_member = departed
            .as_ref()
            .map(|c| c.member.clone())
            .unwrap_or(Member {
                id,
                name: String::new(),
            });

        if hub.roster.is_empty() {
            // last member out: the session is destroyed with its bags
            hub.room.clear();
            hub.member_props.clear();
            hub.coordinator = None;
        }

        let mut new_coordinator = None;
        if hub.coordinator == Some(id) {
            hub.coordinator = hub.roster.first().copied();
            new_coordinator = hub
                .coordinator
                .and_then(|c| hub.clients.get(&c))
                .map(|c| c.member.clone());
        }

        let remaining: Vec<MemberId> = hub.roster.clone();
        for &other in &remaining {
            hub.queue.push_back(Delivery {
                to: other,
                event: Event::MemberLeft(departed_member.clone()),
            });
        }
        if let Some(coordinator) = new_coordinator {
            for &other in &remaining {
                hub.queue.push_back(Delivery {
                    to: other,
                    event: Event::CoordinatorChanged(coordinator.clone()),
                });
            }
        }
        drop(hub);
        drop(local);
        if let Some(client) = departed {
            client.observer.on_left_session();
        }
    }
}

impl SessionRelay for MemoryRelay {
    fn is_in_session(&self) -> bool {
        self.local.lock().is_some()
    }

    fn local_member(&self) -> Option<Member> {
        let id = (*self.local.lock())?;
        let hub = self.hub.state.lock();
        hub.clients.get(&id).map(|c| c.member.clone())
    }

    fn session_members(&self) -> Vec<Member> {
        let hub = self.hub.state.lock();
        hub.roster
            .iter()
            .filter_map(|id| hub.clients.get(id))
            .map(|c| c.member.clone())
            .collect()
    }

    fn is_coordinator(&self) -> bool {
        let id = *self.local.lock();
        id.is_some() && self.hub.state.lock().coordinator == id
    }

    fn room_properties(&self) -> PropertyMap {
        let Some(id) = *self.local.lock() else {
            return PropertyMap::new();
        };
        let hub = self.hub.state.lock();
        hub.clients
            .get(&id)
            .map(|c| c.room_view.clone())
            .unwrap_or_default()
    }

    fn set_room_properties(&self, changes: PropertyMap) {
        if self.local.lock().is_none() {
            debug!("room write dropped, not in a session");
            return;
        }
        if changes.is_empty() {
            return;
        }
        let mut hub = self.hub.state.lock();
        for (key, value) in &changes {
            hub.room.insert(key.clone(), value.clone());
        }
        hub.writes += 1;
        let recipients = hub.roster.clone();
        for to in recipients {
            hub.queue.push_back(Delivery {
                to,
                event: Event::RoomChanged(changes.clone()),
            });
        }
    }

    fn member_properties(&self, member: MemberId) -> PropertyMap {
        let Some(id) = *self.local.lock() else {
            return PropertyMap::new();
        };
        let hub = self.hub.state.lock();
        hub.clients
            .get(&id)
            .and_then(|c| c.member_views.get(&member).cloned())
            .unwrap_or_default()
    }

    fn set_member_properties(&self, member: MemberId, changes: PropertyMap) {
        if self.local.lock().is_none() {
            debug!("member write dropped, not in a session");
            return;
        }
        if changes.is_empty() {
            return;
        }
        let mut hub = self.hub.state.lock();
        let Some(target) = hub.clients.get(&member).map(|c| c.member.clone()) else {
            debug!(member_id = member, "member write dropped, no such member");
            return;
        };
        let props = hub.member_props.entry(member).or_default();
        for (key, value) in &changes {
            props.insert(key.clone(), value.clone());
        }
        hub.writes += 1;
        let recipients = hub.roster.clone();
        for to in recipients {
            hub.queue.push_back(Delivery {
                to,
                event: Event::MemberChanged(target.clone(), changes.clone()),
            });
        }
    }
}
