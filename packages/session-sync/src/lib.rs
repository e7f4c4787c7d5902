#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

//! Replicated-state synchronization core for session-based card games.
//!
//! Keeps a shared game phase, a set of named integer scores, and a single
//! product-owner role consistent across the members of a session, on top of
//! a third-party real-time relay treated as an opaque transport. The relay
//! contributes membership and a last-write-wins property bag; this crate
//! contributes the reconciliation logic: turning local mutations into bag
//! writes, applying echoed changes back without feedback loops, hydrating
//! late joiners, and healing transient double-claims of the owner role.

pub mod domain;
pub mod error;
pub mod presenter;
pub mod relay;
pub mod sync;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use domain::board::GameBoard;
pub use domain::phase::Phase;
pub use error::SyncError;
pub use presenter::{GamePresenter, NullPresenter};
pub use relay::memory::{MemoryRelay, MemoryRelayHub};
pub use relay::{Member, MemberId, PropertyMap, PropertyValue, RelayObserver, SessionRelay};
pub use sync::{OwnerElection, ScoreReplicator, SessionSync, StateReplicator};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
