//! Round engine for Scribble.
//!
//! One [`Game`] per lobby. It owns:
//!
//! - **The artist queue** ([`ArtistQueue`]): who draws, and whose turn it
//!   is. Only the paint relay task mutates it; everyone else reads the
//!   snapshot it publishes after each change.
//! - **The paint relay**: forwards opaque strokes from the current artist
//!   to every other artist.
//! - **The round loop**, spawned by [`Game::start`]: countdown, then
//!   `rounds × artists` timed turns with hints and guesses, then the
//!   scoreboard.
//! - **Settings and words** ([`GameConfig`], [`WordBank`]): scalar state
//!   behind a lock, adjustable by the host between turns.
//!
//! Everything the game wants to say is sent as an
//! [`Announcement`](scribble_protocol::Announcement) on the channel passed
//! to [`Game::spawn`]. The lobby owning that channel decides who actually
//! receives each line.
//!
//! ```text
//! Lobby ──add/remove/paint──→ paint relay ──strokes──→ artists' DrawHandles
//!   │                              ↑ advance / reset
//!   └──start / next / guess──→ round loop ──Announcement──→ Lobby
//! ```

mod artists;
mod config;
mod error;
mod game;
mod hint;
mod relay;
mod round;
mod timer;
mod words;

pub use artists::ArtistQueue;
pub use config::{GameConfig, GamePhase};
pub use error::GameError;
pub use game::Game;
pub use hint::{Hint, PLACEHOLDER};
pub use timer::{Countdown, CountdownTick, TICK};
pub use words::WordBank;
