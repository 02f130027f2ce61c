//! Line-level protocol for Scribble.
//!
//! This crate defines what the room core hands back to the transport
//! collaborator:
//!
//! - **Lines** ([`ChatLine`]): one rendered chat or system message.
//! - **Scopes** ([`Scope`], [`Announcement`]): who a line is for.
//! - **Handles** ([`ChatHandle`], [`DrawHandle`]): the outbound ends of a
//!   participant's chat and draw sockets.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how a line becomes the
//!   text that is actually delivered.
//!
//! Drawing payloads never pass through a codec. They are opaque bytes
//! ([`PaintPayload`]) relayed verbatim.
//!
//! ```text
//! Game / Lobby (Announcement) → Codec (String) → ChatHandle → transport
//! ```

mod codec;
mod error;
mod line;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use line::{
    Announcement, ChatHandle, ChatLine, DrawHandle, PaintPayload, Scope,
    SYSTEM_SENDER,
};
