//! # Scribble
//!
//! Room orchestration for multiplayer drawing and word-guessing games.
//!
//! A process creates one [`Scribble`] context and hands it to its
//! transport layer. Rooms are created and joined through it; chat lines
//! and opaque paint strokes are pushed in, and rendered lines and strokes
//! come back out through each presence's handles.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scribble::prelude::*;
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> Result<(), ScribbleError> {
//! scribble::init_tracing();
//! let scribble = Scribble::new(RegistryConfig::default());
//!
//! scribble.create_lobby("trivia", "pw", "alice").await?;
//! let (chat, _lines) = mpsc::unbounded_channel();
//! scribble.attach_chat("trivia", "alice", chat).await?;
//!
//! scribble.submit_chat_line("trivia", "alice", "/players").await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod telemetry;

pub use context::Scribble;
pub use error::ScribbleError;
pub use telemetry::{DEFAULT_FILTER, init_tracing};

pub use scribble_game::{GameConfig, GameError, GamePhase};
pub use scribble_lobby::{
    Lobby, LobbyConfig, LobbyError, Registry, RegistryConfig, RegistryError, Roster,
};
pub use scribble_presence::{Handles, Presence, PresenceError, PresenceStatus};
pub use scribble_protocol::{
    ChatHandle, ChatLine, Codec, DrawHandle, JsonCodec, PaintPayload, ProtocolError, Scope,
};

/// Everything a transport layer usually needs.
pub mod prelude {
    pub use crate::{
        ChatHandle, ChatLine, DrawHandle, Handles, Lobby, PaintPayload, RegistryConfig, Scribble,
        ScribbleError,
    };
}
