//! Lobbies and the registry that owns them.
//!
//! Each [`Lobby`] runs as its own Tokio task (actor model) owning the
//! roster, the chat fan-out, the slash-command interpreter and the sweep
//! that purges participants whose reconnect window ran out. It composes
//! one [`Game`](scribble_game::Game).
//!
//! The [`Registry`] maps lobby names to lobbies. Its loop is the only
//! writer of that map: creations arrive on a channel, and a lobby that
//! empties reports itself on another.
//!
//! # Key types
//!
//! - [`Registry`]: create, find, join, reconnect
//! - [`Lobby`]: handle to one running lobby
//! - [`Roster`]: snapshot of a lobby's presences and host
//! - [`LobbyConfig`], [`RegistryConfig`]: grace windows and intervals

mod commands;
mod config;
mod error;
mod lobby;
mod names;
mod registry;

pub use commands::COMMAND_PREFIX;
pub use config::{LobbyConfig, RegistryConfig};
pub use error::{LobbyError, RegistryError};
pub use lobby::{Lobby, Roster};
pub use names::{DEFAULT_NAME, unique_name};
pub use registry::Registry;
