//! Library-internal fault taxonomy.
//!
//! Relay delivery is fire-and-forget, so nothing here crosses the crate
//! boundary as a `Result`: event-path callers absorb these with a log and
//! move on. The variants exist so decode helpers and precondition checks
//! share one vocabulary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A bag entry could not be decoded as the expected type.
    #[error("malformed value for key `{key}`: {detail}")]
    MalformedValue { key: String, detail: String },

    /// A mutating operation was requested outside an active session.
    #[error("not in a session")]
    NotInSession,

    /// The component was built without its local mirror and is disabled.
    #[error("no game board attached")]
    BoardDetached,
}
