//! Unified error type for the Scribble backend.

use scribble_game::GameError;
use scribble_lobby::{LobbyError, RegistryError};
use scribble_presence::PresenceError;
use scribble_protocol::ProtocolError;

/// Top-level error that wraps all crate-specific errors.
///
/// Callers of [`Scribble`](crate::Scribble) handle this one type instead
/// of importing errors from each sub-crate. `#[from]` on each variant
/// lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ScribbleError {
    /// Line encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A reconnect was refused.
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// A game setting or start request was rejected.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A presence was missing or the lobby has closed.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// Lobby lookup, creation or password failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ScribbleError {
    /// Returns `true` for a wrong room password.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::Unauthorized(_)))
    }

    /// Returns `true` when the room or presence does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Registry(RegistryError::NotFound(_))
                | Self::Registry(RegistryError::Lobby(LobbyError::NotFound(_)))
                | Self::Lobby(LobbyError::NotFound(_))
        )
    }
}
