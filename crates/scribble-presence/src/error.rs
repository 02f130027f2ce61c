//! Error types for the presence layer.

/// Errors that can occur when a participant tries to come back.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The grace window elapsed (or the participant left on purpose)
    /// before the reconnect arrived. The reaper will purge the presence.
    #[error("reconnect window expired for {0}")]
    Expired(String),

    /// The reaper already removed this presence from its lobby.
    #[error("presence {0} was evicted")]
    Evicted(String),
}
