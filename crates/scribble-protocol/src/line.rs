//! Core line types: what a room says, and to whom.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Sender name used for every line the room itself produces.
///
/// Participants can never hold this name; a join that asks for it gets a
/// suffixed variant.
pub const SYSTEM_SENDER: &str = "Scribble";

/// An opaque drawing payload.
///
/// Shared behind an `Arc` so fanning one stroke out to every artist never
/// copies the bytes.
pub type PaintPayload = Arc<[u8]>;

/// Outbound end of a participant's chat socket. Each message is one
/// rendered line.
pub type ChatHandle = mpsc::UnboundedSender<String>;

/// Outbound end of a participant's draw socket.
pub type DrawHandle = mpsc::UnboundedSender<PaintPayload>;

// ---------------------------------------------------------------------------
// ChatLine
// ---------------------------------------------------------------------------

/// One chat message as delivered to clients.
///
/// `time` is the Unix time in milliseconds at which the line was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub sender: String,
    pub content: String,
    pub time: u64,
}

impl ChatLine {
    /// Creates a line stamped with the current wall-clock time.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            time: unix_millis(),
        }
    }

    /// Creates a line sent by the room itself.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(SYSTEM_SENDER, content)
    }

    /// Returns `true` if the room produced this line.
    pub fn is_system(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.content)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Who should receive a line.
///
/// `Artist` is resolved by the lobby at delivery time, so a line queued
/// just before a rotation reaches whoever holds the pencil when it is
/// fanned out. Use `Presence(name)` when the recipient must be pinned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every presence with a chat handle attached.
    All,
    /// Only the presence currently holding the artist role.
    Artist,
    /// Exactly one presence, by name.
    Presence(String),
    /// Everyone except the named presence.
    AllExcept(String),
}

impl Scope {
    /// Returns `true` if a presence called `name` is a recipient, given
    /// the name of the current artist (if any).
    pub fn includes(&self, name: &str, artist: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Artist => artist == Some(name),
            Self::Presence(target) => target == name,
            Self::AllExcept(excluded) => excluded != name,
        }
    }
}

/// A line plus its audience. This is what the round engine pushes to its
/// lobby so game output and chat share one ordered fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub scope: Scope,
    pub line: ChatLine,
}

impl Announcement {
    pub fn new(scope: Scope, line: ChatLine) -> Self {
        Self { scope, line }
    }

    /// A system line for the whole room.
    pub fn all(content: impl Into<String>) -> Self {
        Self::new(Scope::All, ChatLine::system(content))
    }

    /// A private system line for one presence.
    pub fn to(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Scope::Presence(name.into()), ChatLine::system(content))
    }
}
