//! Error types for the lobby layer.

use scribble_presence::PresenceError;

/// Errors from operations on a single lobby.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// No presence by that name is in the lobby.
    #[error("{0} is not in this lobby")]
    NotFound(String),

    /// The lobby's loop has stopped (it emptied or was shut down).
    #[error("lobby {0} is closed")]
    Closed(String),

    /// A reconnect was refused.
    #[error(transparent)]
    Presence(#[from] PresenceError),
}

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A lobby with that name already exists.
    #[error("lobby {0} already exists")]
    Conflict(String),

    /// No lobby by that name.
    #[error("lobby {0} not found")]
    NotFound(String),

    /// Wrong password.
    #[error("wrong password for lobby {0}")]
    Unauthorized(String),

    /// The registry loop has stopped.
    #[error("registry is shut down")]
    Unavailable,

    #[error(transparent)]
    Lobby(#[from] LobbyError),
}
