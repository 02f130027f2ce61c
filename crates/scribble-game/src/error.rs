//! Error types for the game layer.

/// Errors returned by [`Game`](crate::Game) operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// `start` or a setup-only operation while a game is running.
    #[error("a game is already in progress")]
    AlreadyLive,

    /// The word bank is too small to start.
    #[error("need more than {need} words to start, have {have}")]
    NotEnoughWords { have: usize, need: usize },

    /// Nobody is queued to draw.
    #[error("there is nobody to draw")]
    NoArtists,

    /// A setting was outside its allowed range.
    #[error("{setting} must be between {min} and {max}, got {value}")]
    OutOfRange {
        setting: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}
