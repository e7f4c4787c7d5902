use serde::{Deserialize, Serialize};

/// Overall game progression phases, in gameplay order.
///
/// Replicated through the room `state` key as an integer code; every member
/// of a session converges on the same value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Phase {
    /// Session created, nothing dealt yet. Every member starts here without
    /// a bag write.
    #[default]
    Start,
    /// Hands are live.
    InProgress,
    /// Final scores are in.
    Finished,
}

impl Phase {
    /// Integer code stored under the `state` room key.
    pub const fn code(self) -> i64 {
        match self {
            Phase::Start => 0,
            Phase::InProgress => 1,
            Phase::Finished => 2,
        }
    }

    /// Decodes a bag code; unknown codes yield `None`.
    pub const fn from_code(code: i64) -> Option<Phase> {
        match code {
            0 => Some(Phase::Start),
            1 => Some(Phase::InProgress),
            2 => Some(Phase::Finished),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::InProgress => "in_progress",
            Phase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
