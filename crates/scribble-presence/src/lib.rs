//! Participant presence for Scribble.
//!
//! A [`Presence`] is one named participant in a lobby. It carries:
//!
//! 1. **Identity and score**: a name that is unique within its lobby and
//!    a running point total.
//! 2. **Two independent handles**: the outbound ends of the chat socket
//!    and the draw socket. Either may be attached or detached on its own.
//! 3. **Connection status**: whether the participant is here, dropped
//!    (inside the reconnect grace window), deliberately gone, or evicted.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby / Game (above)  ← own Arc<Presence> in their rosters and queues
//!     ↕
//! Presence (this crate) ← scalar state behind a per-presence RwLock
//!     ↕
//! Protocol (below)      ← ChatHandle, DrawHandle, PaintPayload
//! ```
//!
//! Every read here takes the presence's own lock for a few instructions,
//! so accessors never wait on a lobby or game loop.

mod error;
mod presence;

pub use error::PresenceError;
pub use presence::{Handles, Presence, PresenceStatus};
