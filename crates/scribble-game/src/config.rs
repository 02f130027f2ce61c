//! Game configuration and phase state machine.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings for one lobby's game.
///
/// `round_duration_secs` and `rounds` are only the starting values; the
/// host can change both at runtime within the ranges below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seconds the artist gets per turn.
    pub round_duration_secs: u32,

    /// How many times every artist draws.
    pub rounds: u32,

    /// Length of the "starting in N" countdown before the first turn.
    pub countdown_secs: u32,

    /// The word bank must hold strictly more words than this to start.
    pub min_words: usize,

    /// Points for a correct guess.
    pub guess_points: u32,

    /// A new letter is revealed every this many seconds of a turn.
    pub hint_interval_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: 80,
            rounds: 3,
            countdown_secs: 3,
            min_words: 10,
            guess_points: 100,
            hint_interval_secs: 30,
        }
    }
}

impl GameConfig {
    pub const MIN_ROUND_DURATION_SECS: u32 = 10;
    pub const MAX_ROUND_DURATION_SECS: u32 = 600;
    pub const MAX_ROUNDS: u32 = 20;

    /// Clamp out-of-range values so the config is safe to run with.
    pub fn validated(mut self) -> Self {
        if !Self::duration_in_range(self.round_duration_secs) {
            let clamped = self.round_duration_secs.clamp(
                Self::MIN_ROUND_DURATION_SECS,
                Self::MAX_ROUND_DURATION_SECS,
            );
            warn!(
                requested = self.round_duration_secs,
                clamped, "round duration out of range, clamping"
            );
            self.round_duration_secs = clamped;
        }
        if !Self::rounds_in_range(self.rounds) {
            let clamped = self.rounds.clamp(1, Self::MAX_ROUNDS);
            warn!(requested = self.rounds, clamped, "rounds out of range, clamping");
            self.rounds = clamped;
        }
        if self.hint_interval_secs == 0 {
            warn!("hint interval of 0 would reveal every tick, using 30");
            self.hint_interval_secs = 30;
        }
        self
    }

    pub fn duration_in_range(secs: u32) -> bool {
        (Self::MIN_ROUND_DURATION_SECS..=Self::MAX_ROUND_DURATION_SECS)
            .contains(&secs)
    }

    pub fn rounds_in_range(rounds: u32) -> bool {
        (1..=Self::MAX_ROUNDS).contains(&rounds)
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// Where a game is in its lifecycle.
///
/// ```text
/// Idle → Countdown → Drawing → Idle
/// ```
///
/// A game is "live" in every phase except `Idle`. Only a successful
/// `start` leaves `Idle`, and only the end of the round loop (or a
/// shutdown) returns to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Idle,
    Countdown,
    Drawing,
}

impl GamePhase {
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Countdown => write!(f, "Countdown"),
            Self::Drawing => write!(f, "Drawing"),
        }
    }
}
