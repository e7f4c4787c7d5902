//! Replicated bag keys used by the core.

/// Room key holding the encoded game phase.
pub const STATE: &str = "state";

/// Prefix of per-series score counters (`score:<name>`).
pub const SCORE_PREFIX: &str = "score:";

/// Member key carrying the product-owner flag.
pub const IS_OWNER: &str = "isOwner";

/// Room key for the score series `name`.
pub fn score_key(name: &str) -> String {
    format!("{SCORE_PREFIX}{name}")
}

/// Recovers the series name from a `score:`-prefixed room key.
pub fn score_name(key: &str) -> Option<&str> {
    key.strip_prefix(SCORE_PREFIX)
}
